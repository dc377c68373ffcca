//! Entry repository.
//!
//! Provides CRUD operations for timeline entries and keeps their hashtags
//! in sync with the text.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::schema::{decode_opt_ts, decode_ts, encode_ts, Entry, EntryType, NewEntry};
use crate::tags::{extract_hashtags, TagRepository};

const ENTRY_COLUMNS: &str =
    "e.id, e.type, e.title, e.body, e.author, e.edited_by, e.created_at, e.edited_at";

fn row_to_entry(row: &libsql::Row) -> Result<Entry> {
    Ok(Entry {
        id: row.get::<i64>(0)?,
        entry_type: row.get::<String>(1)?.parse()?,
        title: row.get::<Option<String>>(2)?,
        body: row.get::<String>(3)?,
        author: row.get::<String>(4)?,
        edited_by: row.get::<Option<String>>(5)?,
        created_at: decode_ts(&row.get::<String>(6)?)?,
        edited_at: decode_opt_ts(row.get::<Option<String>>(7)?)?,
        tags: Vec::new(),
    })
}

/// Hashtags an entry should carry: its title always, its body for
/// free-text entries only (other bodies hold JSON, filenames, or code).
fn hashtags_for(entry_type: EntryType, title: Option<&str>, body: &str) -> Vec<String> {
    let mut tags = title.map(extract_hashtags).unwrap_or_default();
    if entry_type == EntryType::Text {
        for tag in extract_hashtags(body) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

/// Repository for entry operations.
#[derive(Clone)]
pub struct EntryRepository {
    db: Arc<Database>,
    tags: TagRepository,
}

impl EntryRepository {
    pub fn new(db: Arc<Database>) -> Self {
        let tags = TagRepository::new(db.clone());
        Self { db, tags }
    }

    /// Insert a new entry stamped with the current time.
    pub async fn insert(&self, new: NewEntry) -> Result<Entry> {
        let now = Utc::now();
        let mut rows = self
            .db
            .connection()
            .query(
                "INSERT INTO entries (type, title, body, author, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING id",
                libsql::params![
                    new.entry_type.as_str(),
                    new.title.as_deref(),
                    new.body.as_str(),
                    new.author.as_str(),
                    encode_ts(&now)
                ],
            )
            .await?;
        let id = rows
            .next()
            .await?
            .ok_or_else(|| DbError::InvalidData("INSERT returned no id".to_string()))?
            .get::<i64>(0)?;
        drop(rows);

        let tags = hashtags_for(new.entry_type, new.title.as_deref(), &new.body);
        if !tags.is_empty() {
            self.tags.set_entry_tags(id, &tags).await?;
        }

        debug!(id, entry_type = %new.entry_type, "entry created");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("entry {id}")))
    }

    /// Find an entry by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.id = ?1");
        let mut rows = self.db.connection().query(&sql, [id]).await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let mut entry = row_to_entry(&row)?;
        drop(rows);
        entry.tags = self.tags.tags_for_entry(id).await?;
        Ok(Some(entry))
    }

    /// Every entry, oldest first (chat style).
    pub async fn list_timeline(&self) -> Result<Vec<Entry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries e ORDER BY e.created_at ASC, e.id ASC");
        self.fetch(&sql, ()).await
    }

    /// Entries of one type, oldest first.
    pub async fn list_by_type(&self, entry_type: EntryType) -> Result<Vec<Entry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.type = ?1 ORDER BY e.created_at ASC, e.id ASC"
        );
        self.fetch(&sql, [entry_type.as_str()]).await
    }

    /// Entries carrying a tag, oldest first.
    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<Entry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries e
             JOIN entry_tags et ON et.entry_id = e.id
             JOIN tags t ON t.id = et.tag_id
             WHERE t.name = ?1
             ORDER BY e.created_at ASC, e.id ASC"
        );
        let name = tag.trim_start_matches('#').to_lowercase();
        self.fetch(&sql, [name.as_str()]).await
    }

    async fn fetch(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<Vec<Entry>> {
        let mut rows = self.db.connection().query(sql, params).await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }
        drop(rows);

        let mut tag_map = self.tags.tags_by_entry().await?;
        for entry in &mut entries {
            if let Some(tags) = tag_map.remove(&entry.id) {
                entry.tags = tags;
            }
        }
        Ok(entries)
    }

    /// Replace the title and body of an entry and stamp it as edited.
    ///
    /// `created_at` is left untouched so the entry keeps its place in the
    /// timeline.
    pub async fn update_content(
        &self,
        id: i64,
        title: Option<&str>,
        body: &str,
        edited_by: Option<&str>,
    ) -> Result<Entry> {
        let mut entry = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("entry {id}")))?;
        entry.mark_edited(edited_by);
        let edited_at = entry.edited_at.unwrap_or_else(Utc::now);

        self.db
            .connection()
            .execute(
                "UPDATE entries SET title = ?1, body = ?2, edited_by = ?3, edited_at = ?4 WHERE id = ?5",
                libsql::params![title, body, edited_by, encode_ts(&edited_at), id],
            )
            .await?;

        let tags = hashtags_for(entry.entry_type, title, body);
        self.tags.set_entry_tags(id, &tags).await?;
        self.tags.prune_unused().await?;

        debug!(id, "entry edited");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("entry {id}")))
    }

    /// Delete an entry. Returns the removed row, if it existed.
    pub async fn delete(&self, id: i64) -> Result<Option<Entry>> {
        let Some(entry) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        self.db
            .connection()
            .execute("DELETE FROM entries WHERE id = ?1", [id])
            .await?;
        self.tags.prune_unused().await?;
        debug!(id, "entry deleted");
        Ok(Some(entry))
    }

    /// Count all entries.
    pub async fn count(&self) -> Result<u64> {
        self.db.scalar_count("SELECT COUNT(*) FROM entries", ()).await
    }

    /// Count entries of one type.
    pub async fn count_by_type(&self, entry_type: EntryType) -> Result<u64> {
        self.db
            .scalar_count("SELECT COUNT(*) FROM entries WHERE type = ?1", [entry_type.as_str()])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashtags_from_title_and_text_body() {
        let tags = hashtags_for(EntryType::Text, Some("#setup"), "Mounted #sample and #setup");
        assert_eq!(tags, vec!["setup", "sample"]);
    }

    #[test]
    fn test_hashtags_skip_non_text_bodies() {
        let tags = hashtags_for(EntryType::Code, Some("Fit #peaks"), "#Load workspace");
        assert_eq!(tags, vec!["peaks"]);
    }
}
