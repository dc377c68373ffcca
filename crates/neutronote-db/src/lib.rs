//! neutroNote Database Layer
//!
//! Embedded libSQL (SQLite) storage for the notebook timeline: entries,
//! hashtags, and the per-notebook IPTS configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use neutronote_db::{Database, EntryRepository, EntryType, NewEntry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Arc::new(Database::open("./instance/neutronote.db").await?);
//!     db.initialize().await?;
//!
//!     let entries = EntryRepository::new(db);
//!     entries.insert(NewEntry::new(EntryType::Text, "Sample aligned #alignment")).await?;
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod schema;
pub mod entries;
pub mod tags;
pub mod notebook;

pub use database::{Database, DatabaseStats};
pub use error::{DbError, Result};
pub use schema::{Entry, EntryType, NewEntry, NotebookConfig, Tag};
pub use entries::EntryRepository;
pub use tags::{extract_hashtags, TagRepository};
pub use notebook::NotebookConfigRepository;
