//! neutronote-common — Shared types, errors, and helpers used across all neutroNote crates.

pub mod error;
pub mod format;
pub mod ipts;

// Re-export commonly used types
pub use error::{ApiError, NeutronoteError, Result};
pub use ipts::{notebook_dir, Ipts};
