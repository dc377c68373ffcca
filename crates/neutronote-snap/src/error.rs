use thiserror::Error;

use neutronote_common::NeutronoteError;

#[derive(Error, Debug)]
pub enum SnapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HDF5 support not enabled")]
    Hdf5Unavailable,

    #[error("{0}")]
    Read(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, SnapError>;

impl From<SnapError> for NeutronoteError {
    fn from(err: SnapError) -> Self {
        match err {
            SnapError::NotFound(what) => NeutronoteError::NotFound(what),
            SnapError::Io(e) => NeutronoteError::Io(e),
            other => NeutronoteError::Other(other.into()),
        }
    }
}

#[cfg(feature = "hdf5")]
impl From<hdf5::Error> for SnapError {
    fn from(err: hdf5::Error) -> Self {
        SnapError::Read(err.to_string())
    }
}
