//! Starfish CLI library.
//!
//! Shared pieces of the `starfish` binary: configuration, initial-stack
//! parsing, per-tick state rendering, and diagnostics.

pub mod colors;
pub mod config;
pub mod error;
pub mod initial_stack;
pub mod view;

pub use error::CliError;
