use starfish_core::LoadError;
use starfish_vm::VmError;
use thiserror::Error;

/// Everything that can stop the `starfish` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),
    #[error("invalid initial stack: {0}")]
    InvalidStack(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Vm(#[from] VmError),
}
