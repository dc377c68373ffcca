//! Database error types.

use neutronote_common::{ApiError, NeutronoteError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DbError> for NeutronoteError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => NeutronoteError::NotFound(what),
            DbError::Io(e) => NeutronoteError::Io(e),
            DbError::Serialization(e) => NeutronoteError::Serialization(e),
            other => NeutronoteError::Database(other.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        NeutronoteError::from(err).into()
    }
}
