use thiserror::Error;

use neutronote_common::NeutronoteError;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Failed to start kernel: {0}")]
    Spawn(std::io::Error),

    #[error("Kernel I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Kernel protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("Kernel did not reply within {0} s")]
    Timeout(u64),

    #[error("Kernel closed its output")]
    Eof,

    #[error("Kernel is not running")]
    NotRunning,
}

pub type Result<T> = std::result::Result<T, KernelError>;

impl From<KernelError> for NeutronoteError {
    fn from(err: KernelError) -> Self {
        NeutronoteError::Kernel(err.to_string())
    }
}
