//! Database connection and schema management.
//!
//! Provides a unified handle over a single libSQL connection.

use crate::error::{DbError, Result};
use libsql::Builder;
use std::path::Path;
use tracing::{debug, info};

const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

/// Main database handle.
///
/// Holds one connection for the lifetime of the process. An in-memory
/// database only exists on the connection that created it, so every
/// repository shares this one.
pub struct Database {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    path: String,
}

impl Database {
    /// Open or create a database file at the specified path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let path_str = path.to_string_lossy().to_string();
        Self::connect(path_str).await
    }

    /// Open a private in-memory database (tests, previews).
    pub async fn open_in_memory() -> Result<Self> {
        Self::connect(":memory:".to_string()).await
    }

    async fn connect(path: String) -> Result<Self> {
        let db = Builder::new_local(&path).build().await?;
        let conn = db.connect()?;

        // Foreign keys are per-connection in SQLite
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DbError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        debug!(path = %path, "opened libSQL database");
        Ok(Self { db, conn, path })
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create all tables and indexes if they don't exist.
    pub async fn initialize(&self) -> Result<()> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DbError::Migration(format!("001_initial: {e}")))?;
        info!(path = %self.path, "database schema ready");
        Ok(())
    }

    /// Check if a table exists.
    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Run a `SELECT COUNT(*) ...` style query and return the first column.
    pub(crate) async fn scalar_count(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<u64> {
        let mut rows = self.conn.query(sql, params).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?.max(0) as u64),
            None => Ok(0),
        }
    }

    /// Get table statistics.
    pub async fn stats(&self) -> Result<DatabaseStats> {
        Ok(DatabaseStats {
            entries: self.scalar_count("SELECT COUNT(*) FROM entries", ()).await?,
            tags: self.scalar_count("SELECT COUNT(*) FROM tags", ()).await?,
            edited_entries: self
                .scalar_count("SELECT COUNT(*) FROM entries WHERE edited_at IS NOT NULL", ())
                .await?,
        })
    }
}

/// Database statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DatabaseStats {
    pub entries: u64,
    pub tags: u64,
    pub edited_entries: u64,
}
