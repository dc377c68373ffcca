//! Row types for the notebook tables.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use neutronote_common::format::format_entry_timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{DbError, Result};

pub const TABLE_ENTRIES: &str = "entries";
pub const TABLE_TAGS: &str = "tags";
pub const TABLE_ENTRY_TAGS: &str = "entry_tags";
pub const TABLE_NOTEBOOK_CONFIG: &str = "notebook_config";

/// Author recorded when the creator did not give a name.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Instrument a fresh notebook is configured for.
pub const DEFAULT_INSTRUMENT: &str = "SNAP";

// =============================================================================
// Timestamps
// =============================================================================

/// Fixed-width RFC 3339 so lexical order in SQL equals chronological order.
pub(crate) fn encode_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_ts(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DbError::InvalidData(format!("bad timestamp '{s}': {e}")))
}

pub(crate) fn decode_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(decode_ts(&s)?)),
        _ => Ok(None),
    }
}

// =============================================================================
// Entry
// =============================================================================

/// Kind of timeline record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Text,
    Header,
    Image,
    Data,
    Code,
}

impl EntryType {
    pub const ALL: [EntryType; 5] = [
        EntryType::Text,
        EntryType::Header,
        EntryType::Image,
        EntryType::Data,
        EntryType::Code,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Text => "text",
            EntryType::Header => "header",
            EntryType::Image => "image",
            EntryType::Data => "data",
            EntryType::Code => "code",
        }
    }

    /// Headers are generated from run files and never hand-edited.
    pub fn is_editable(&self) -> bool {
        !matches!(self, EntryType::Header)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        EntryType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DbError::InvalidData(format!("unknown entry type '{s}'")))
    }
}

/// A single notebook entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub title: Option<String>,
    pub body: String,
    pub author: String,
    pub edited_by: Option<String>,
    /// Timeline position; never changes after creation.
    pub created_at: DateTime<Utc>,
    /// `None` until the first edit.
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Entry {
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    pub fn timestamp_display(&self) -> String {
        format_entry_timestamp(&self.created_at)
    }

    pub fn edited_at_display(&self) -> Option<String> {
        self.edited_at.as_ref().map(format_entry_timestamp)
    }

    pub fn mark_edited(&mut self, by: Option<&str>) {
        self.edited_at = Some(Utc::now());
        self.edited_by = by.map(str::to_string);
    }
}

/// Values for a new entry; `created_at` is assigned on insert.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub entry_type: EntryType,
    pub title: Option<String>,
    pub body: String,
    pub author: String,
}

impl NewEntry {
    pub fn new(entry_type: EntryType, body: impl Into<String>) -> Self {
        Self {
            entry_type,
            title: None,
            body: body.into(),
            author: DEFAULT_AUTHOR.to_string(),
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        if let Some(author) = author.filter(|a| !a.trim().is_empty()) {
            self.author = author;
        }
        self
    }
}

// =============================================================================
// Tag
// =============================================================================

/// A hashtag with the number of entries carrying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub entry_count: u64,
}

// =============================================================================
// Notebook configuration
// =============================================================================

/// Notebook-level configuration (one row per notebook database).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotebookConfig {
    pub id: i64,
    pub ipts: Option<String>,
    pub instrument: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NotebookConfig {
    pub fn is_configured(&self) -> bool {
        self.ipts.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_type_strings() {
        let names: Vec<&str> = EntryType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, ["text", "header", "image", "data", "code"]);
        assert_eq!("image".parse::<EntryType>().unwrap(), EntryType::Image);
        assert!("video".parse::<EntryType>().is_err());
    }

    #[test]
    fn test_only_headers_are_read_only() {
        assert!(!EntryType::Header.is_editable());
        assert!(EntryType::Text.is_editable());
        assert!(EntryType::Code.is_editable());
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2026, 1, 30, 9, 59, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 1, 30, 10, 0, 0).unwrap();
        assert!(encode_ts(&a) < encode_ts(&b));
        assert_eq!(decode_ts(&encode_ts(&a)).unwrap(), a);
    }

    #[test]
    fn test_decode_sqlite_default_format() {
        let dt = decode_ts("2026-02-09 14:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 2, 9, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_new_entry_ignores_blank_author() {
        let entry = NewEntry::new(EntryType::Text, "x").with_author(Some("  ".into()));
        assert_eq!(entry.author, DEFAULT_AUTHOR);
        let entry = NewEntry::new(EntryType::Text, "x").with_author(Some("Ada".into()));
        assert_eq!(entry.author, "Ada");
    }

    #[test]
    fn test_notebook_is_configured() {
        let mut config = NotebookConfig {
            id: 1,
            ipts: None,
            instrument: DEFAULT_INSTRUMENT.into(),
            title: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        assert!(!config.is_configured());
        config.ipts = Some("  ".into());
        assert!(!config.is_configured());
        config.ipts = Some("IPTS-1".into());
        assert!(config.is_configured());
    }
}
