//! Notebook configuration repository (single row per database).

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::schema::{decode_opt_ts, decode_ts, encode_ts, NotebookConfig, DEFAULT_INSTRUMENT};

fn row_to_config(row: &libsql::Row) -> Result<NotebookConfig> {
    Ok(NotebookConfig {
        id: row.get::<i64>(0)?,
        ipts: row.get::<Option<String>>(1)?,
        instrument: row.get::<String>(2)?,
        title: row.get::<Option<String>>(3)?,
        created_at: decode_ts(&row.get::<String>(4)?)?,
        updated_at: decode_opt_ts(row.get::<Option<String>>(5)?)?,
    })
}

#[derive(Clone)]
pub struct NotebookConfigRepository {
    db: Arc<Database>,
}

impl NotebookConfigRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn first(&self) -> Result<Option<NotebookConfig>> {
        let mut rows = self
            .db
            .connection()
            .query(
                "SELECT id, ipts, instrument, title, created_at, updated_at
                 FROM notebook_config ORDER BY id ASC LIMIT 1",
                (),
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_config(&row)?)),
            None => Ok(None),
        }
    }

    /// Get the singleton config, creating an unconfigured one if missing.
    pub async fn get_or_create(&self) -> Result<NotebookConfig> {
        if let Some(config) = self.first().await? {
            return Ok(config);
        }
        self.db
            .connection()
            .execute(
                "INSERT INTO notebook_config (instrument, created_at) VALUES (?1, ?2)",
                (DEFAULT_INSTRUMENT, encode_ts(&Utc::now())),
            )
            .await?;
        self.first()
            .await?
            .ok_or_else(|| DbError::NotFound("notebook config".to_string()))
    }

    /// Point the notebook at an IPTS and optionally retitle it.
    pub async fn configure(&self, ipts: &str, title: Option<&str>) -> Result<NotebookConfig> {
        let config = self.get_or_create().await?;
        self.db
            .connection()
            .execute(
                "UPDATE notebook_config SET ipts = ?1, title = ?2, updated_at = ?3 WHERE id = ?4",
                libsql::params![ipts, title, encode_ts(&Utc::now()), config.id],
            )
            .await?;
        info!(ipts, "notebook configured");
        self.first()
            .await?
            .ok_or_else(|| DbError::NotFound("notebook config".to_string()))
    }
}
