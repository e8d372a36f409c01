//! Capture history outside queue mode.

use crate::{Database, Result, StorageError};
use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use flowclip_queue::ClipContent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Text,
    Image,
}

impl HistoryKind {
    fn as_str(self) -> &'static str {
        match self {
            HistoryKind::Text => "text",
            HistoryKind::Image => "image",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(HistoryKind::Text),
            "image" => Some(HistoryKind::Image),
            _ => None,
        }
    }
}

/// One recorded capture. Images keep their dimensions only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub kind: HistoryKind,
    pub text: Option<String>,
    pub width: Option<usize>,
    pub height: Option<usize>,
}

impl HistoryEntry {
    pub fn from_content(content: &ClipContent) -> Self {
        let (kind, text, width, height) = match content {
            ClipContent::Text(text) => (HistoryKind::Text, Some(text.clone()), None, None),
            ClipContent::Image(image) => {
                (HistoryKind::Image, None, Some(image.width), Some(image.height))
            }
        };
        Self {
            id: Uuid::new_v4(),
            // Stored with millisecond precision
            captured_at: Utc::now().trunc_subsecs(3),
            kind,
            text,
            width,
            height,
        }
    }
}

/// Repository for capture history.
pub trait HistoryRepository {
    type Error;
    fn append_history(&self, entry: &HistoryEntry) -> std::result::Result<(), Self::Error>;
    /// Newest first.
    fn recent_history(&self, limit: usize) -> std::result::Result<Vec<HistoryEntry>, Self::Error>;
    fn get_history(&self, id: &Uuid) -> std::result::Result<HistoryEntry, Self::Error>;
    fn clear_history(&self) -> std::result::Result<(), Self::Error>;
}

type HistoryRow = (String, i64, String, Option<String>, Option<i64>, Option<i64>);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn entry_from_row(row: HistoryRow) -> Option<HistoryEntry> {
    let (id, captured_at, kind, text, width, height) = row;
    Some(HistoryEntry {
        id: Uuid::parse_str(&id).ok()?,
        captured_at: Utc.timestamp_millis_opt(captured_at).single()?,
        kind: HistoryKind::parse(&kind)?,
        text,
        width: width.and_then(|w| usize::try_from(w).ok()),
        height: height.and_then(|h| usize::try_from(h).ok()),
    })
}

impl HistoryRepository for Database {
    type Error = StorageError;

    fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO history (id, captured_at, kind, text, width, height) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                entry.id.to_string(),
                entry.captured_at.timestamp_millis(),
                entry.kind.as_str(),
                &entry.text,
                entry.width.map(|w| w as i64),
                entry.height.map(|h| h as i64),
            ),
        )?;
        Ok(())
    }

    fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, captured_at, kind, text, width, height FROM history ORDER BY captured_at DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], read_row)?;

        let mut entries = Vec::new();
        for row in rows {
            match entry_from_row(row?) {
                Some(entry) => entries.push(entry),
                None => tracing::warn!("skipping malformed history row"),
            }
        }
        Ok(entries)
    }

    fn get_history(&self, id: &Uuid) -> Result<HistoryEntry> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT id, captured_at, kind, text, width, height FROM history WHERE id = ?1",
                [id.to_string()],
                read_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StorageError::NotFound(format!("history entry {id}"))
                }
                other => StorageError::DatabaseError(other),
            })?;
        entry_from_row(row).ok_or_else(|| StorageError::NotFound(format!("history entry {id}")))
    }

    fn clear_history(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM history", [])?;
        Ok(())
    }
}
