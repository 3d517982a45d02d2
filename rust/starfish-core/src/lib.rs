//! Starfish Core
//!
//! The data model shared by the VM and the CLI: numeric values, stacks,
//! the stack-of-stacks with its register, and the mutable codebox grid.

pub mod codebox;
pub mod stack;
pub mod values;

pub use codebox::{Cell, Codebox, CodeboxError, LoadError};
pub use stack::{Stack, StackError, StackFrames};
pub use values::Value;
