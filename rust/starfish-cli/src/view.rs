//! Per-tick state dumps for `--output-codebox` and `--output-stack`.

use starfish_core::{Codebox, StackFrames};
use starfish_vm::Pointer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub codebox: bool,
    pub stack: bool,
}

impl ViewOptions {
    pub fn is_enabled(&self) -> bool {
        self.codebox || self.stack
    }
}

/// Render the grid with the next cell marked and/or the active stack.
pub fn render_state(
    options: ViewOptions,
    codebox: &Codebox,
    pointer: &Pointer,
    stacks: &StackFrames,
) -> String {
    let mut out = String::new();
    if options.codebox {
        out.push_str(&codebox.render_with_cursor(pointer.row, pointer.col));
    }
    if options.stack {
        out.push_str(&format!("Stack: {}\n", stacks.active()));
    }
    out
}
