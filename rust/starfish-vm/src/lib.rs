//! Starfish VM: tick-based interpreter for *><> codeboxes.

pub mod io;
pub mod pointer;
pub mod vm;

pub use pointer::{Direction, Mirror, Pointer};
pub use vm::{DebugEvent, Fault, FaultKind, RunOutcome, Status, VmError, VM};
