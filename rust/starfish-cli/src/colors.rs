//! ANSI color helpers for CLI diagnostics.

fn paint(code: &str, s: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", code, s)
}

/// Prefix color for `error:` lines.
pub fn red(s: &str) -> String {
    paint("31", s)
}

/// Prefix color for `warning:` lines.
pub fn yellow(s: &str) -> String {
    paint("33", s)
}
