//! Tag repository and hashtag extraction.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex::Regex;

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::schema::{decode_ts, encode_ts, Tag};

fn hashtag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The leading group stands in for a lookbehind: a tag must not follow a
    // word character, '&' (HTML entities) or another '#'.
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^A-Za-z0-9_&#])#([A-Za-z][A-Za-z0-9_-]*)").expect("static regex")
    })
}

/// Extract `#hashtags` from free text.
///
/// Tags are lowercased and returned once each, in order of first
/// appearance. Lines inside fenced code blocks are skipped.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut in_fence = false;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for cap in hashtag_regex().captures_iter(line) {
            let tag = cap[1].to_lowercase();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

/// Repository for tag operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<Database>,
}

impl TagRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Return the id of the named tag, creating it if needed.
    pub async fn get_or_create(&self, name: &str) -> Result<i64> {
        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO tags (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
            (name, encode_ts(&Utc::now())),
        )
        .await?;
        let mut rows = conn.query("SELECT id FROM tags WHERE name = ?1", [name]).await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DbError::NotFound(format!("tag #{name}")))?;
        Ok(row.get::<i64>(0)?)
    }

    /// All tags ordered by name, with usage counts.
    pub async fn list_with_counts(&self) -> Result<Vec<Tag>> {
        let mut rows = self
            .db
            .connection()
            .query(
                "SELECT t.id, t.name, t.created_at, COUNT(et.entry_id)
                 FROM tags t
                 LEFT JOIN entry_tags et ON et.tag_id = t.id
                 GROUP BY t.id, t.name, t.created_at
                 ORDER BY t.name ASC",
                (),
            )
            .await?;

        let mut tags = Vec::new();
        while let Some(row) = rows.next().await? {
            tags.push(Tag {
                id: row.get::<i64>(0)?,
                name: row.get::<String>(1)?,
                created_at: decode_ts(&row.get::<String>(2)?)?,
                entry_count: row.get::<i64>(3)?.max(0) as u64,
            });
        }
        Ok(tags)
    }

    /// Tag names attached to one entry, sorted.
    pub async fn tags_for_entry(&self, entry_id: i64) -> Result<Vec<String>> {
        let mut rows = self
            .db
            .connection()
            .query(
                "SELECT t.name FROM entry_tags et
                 JOIN tags t ON t.id = et.tag_id
                 WHERE et.entry_id = ?1
                 ORDER BY t.name ASC",
                [entry_id],
            )
            .await?;
        let mut names = Vec::new();
        while let Some(row) = rows.next().await? {
            names.push(row.get::<String>(0)?);
        }
        Ok(names)
    }

    /// Tag names for every tagged entry, keyed by entry id.
    pub async fn tags_by_entry(&self) -> Result<HashMap<i64, Vec<String>>> {
        let mut rows = self
            .db
            .connection()
            .query(
                "SELECT et.entry_id, t.name FROM entry_tags et
                 JOIN tags t ON t.id = et.tag_id
                 ORDER BY t.name ASC",
                (),
            )
            .await?;
        let mut map: HashMap<i64, Vec<String>> = HashMap::new();
        while let Some(row) = rows.next().await? {
            map.entry(row.get::<i64>(0)?)
                .or_default()
                .push(row.get::<String>(1)?);
        }
        Ok(map)
    }

    /// Replace the tag set of an entry.
    pub async fn set_entry_tags(&self, entry_id: i64, names: &[String]) -> Result<()> {
        self.db
            .connection()
            .execute("DELETE FROM entry_tags WHERE entry_id = ?1", [entry_id])
            .await?;
        for name in names {
            let tag_id = self.get_or_create(name).await?;
            self.db
                .connection()
                .execute(
                    "INSERT OR IGNORE INTO entry_tags (entry_id, tag_id) VALUES (?1, ?2)",
                    (entry_id, tag_id),
                )
                .await?;
        }
        Ok(())
    }

    /// Delete tags no entry refers to any more. Returns how many were removed.
    pub async fn prune_unused(&self) -> Result<u64> {
        let removed = self
            .db
            .connection()
            .execute(
                "DELETE FROM tags WHERE id NOT IN (SELECT DISTINCT tag_id FROM entry_tags)",
                (),
            )
            .await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_simple_tags() {
        assert_eq!(
            extract_hashtags("Aligned the #sample, then #Cooling started"),
            vec!["sample", "cooling"]
        );
    }

    #[test]
    fn test_deduplicates_in_first_seen_order() {
        assert_eq!(extract_hashtags("#b #a #B"), vec!["b", "a"]);
    }

    #[test]
    fn test_ignores_markdown_headings_and_numbers() {
        assert!(extract_hashtags("# Heading\n## Sub").is_empty());
        assert!(extract_hashtags("sample #3 of 5").is_empty());
    }

    #[test]
    fn test_ignores_mid_word_and_entities() {
        assert!(extract_hashtags("C#sharp and &#x27;quoted&#39;").is_empty());
        assert!(extract_hashtags("a##double").is_empty());
    }

    #[test]
    fn test_skips_fenced_code() {
        let text = "Before #keep\n```python\nx = 1  #notatag\n```\nafter #also";
        assert_eq!(extract_hashtags(text), vec!["keep", "also"]);
    }

    #[test]
    fn test_allows_dashes_and_underscores() {
        assert_eq!(extract_hashtags("(#high-pressure_cell)"), vec!["high-pressure_cell"]);
    }
}
