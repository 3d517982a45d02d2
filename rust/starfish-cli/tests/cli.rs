//! Integration tests that drive the `starfish` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// =============================================================================
// Helper
// =============================================================================

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("starfish_test_cli").join(name);
    // Clean up from any prior run
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_script(dir: &Path, source: &str) -> PathBuf {
    let path = dir.join("script.fish");
    std::fs::write(&path, source).expect("write script");
    path
}

fn starfish(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_starfish"))
        .current_dir(dir)
        .env_remove("STARFISH_LOG")
        .args(args)
        .output()
        .expect("run starfish")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// =============================================================================
// Running scripts
// =============================================================================

#[test]
fn runs_script_and_prints_output() {
    let dir = temp_dir("hello");
    let script = write_script(&dir, "\"!iH\"v\n     >l?!;o\n");
    let output = starfish(&dir, &[script.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Hi!");
}

#[test]
fn initial_stack_flag_seeds_the_stack() {
    let dir = temp_dir("stack_flag");
    let script = write_script(&dir, "l?!;o\n");
    let output = starfish(&dir, &["--stack", "'olleh'", script.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "hello");
}

#[test]
fn fault_exits_with_error() {
    let dir = temp_dir("fault");
    let script = write_script(&dir, "50,;\n");
    let output = starfish(&dir, &[script.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("error:"));
    assert!(err.contains("division by zero"));
    assert!(err.contains("row 0, column 2"));
}

#[test]
fn tick_limit_flag_stops_runaway_script() {
    let dir = temp_dir("max_ticks");
    let script = write_script(&dir, ">\n");
    let output = starfish(&dir, &["--max-ticks", "20", script.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("tick limit exceeded"));
}

#[test]
fn output_stack_flag_dumps_state() {
    let dir = temp_dir("output_stack");
    let script = write_script(&dir, "12;\n");
    let output = starfish(&dir, &["-S", script.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Stack: []\nStack: [1]\nStack: [1, 2]\n");
}

#[test]
fn missing_script_reports_path() {
    let dir = temp_dir("missing_script");
    let output = starfish(&dir, &["nope.fish"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("nope.fish"));
}

#[test]
fn bad_stack_is_rejected() {
    let dir = temp_dir("bad_stack");
    let script = write_script(&dir, ";\n");
    let output = starfish(&dir, &["-s", "1 zz", script.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("invalid initial stack"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn discovered_config_supplies_stack() {
    let dir = temp_dir("discovered");
    std::fs::write(dir.join("starfish.toml"), "[run]\nstack = [52]\n").unwrap();
    let script = write_script(&dir, "n;\n");
    let output = starfish(&dir, &[script.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "52");
}

#[test]
fn explicit_config_and_flag_override() {
    let dir = temp_dir("explicit");
    let cfg = dir.join("custom.toml");
    std::fs::write(&cfg, "[run]\nstack = [1, 2, 3]\ncompatibility = true\n").unwrap();
    let script = write_script(&dir, "3[n;\n");

    let output = starfish(&dir, &["--config", cfg.to_str().unwrap(), script.to_str().unwrap()]);
    assert_eq!(stdout(&output), "1");

    let output = starfish(
        &dir,
        &["--config", cfg.to_str().unwrap(), "-s", "4 5 6", script.to_str().unwrap()],
    );
    assert_eq!(stdout(&output), "4");
}

#[test]
fn invalid_config_is_reported() {
    let dir = temp_dir("invalid_config");
    let cfg = dir.join("broken.toml");
    std::fs::write(&cfg, "[run]\ndelay = \"soon\"\n").unwrap();
    let script = write_script(&dir, ";\n");
    let output = starfish(&dir, &["--config", cfg.to_str().unwrap(), script.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("invalid toml"));
}
