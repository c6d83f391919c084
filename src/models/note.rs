use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A note owned by a single user.
///
/// Notes are plain title/body text records. The store assigns `id` and both
/// timestamps on creation; the client never fabricates an id for a persisted
/// note. Timestamps travel as integer milliseconds since epoch, matching the
/// hosted table's bigint columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(rename = "user_id")]
    pub owner_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// A note with nothing but whitespace in both title and content.
    ///
    /// Vacant notes are transient: they exist while being edited, but are
    /// garbage-collected when the user navigates away and purged on the next
    /// initial load.
    pub fn is_vacant(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }

    /// Replace title and content, stamping a fresh `updated_at`.
    pub fn with_draft(&self, title: &str, content: &str) -> Note {
        Note {
            title: title.to_string(),
            content: content.to_string(),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Input for creating a note. New notes start vacant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteInput {
    pub title: String,
    pub content: String,
}

/// Partial update persisted after a debounce flush.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNoteInput {
    pub title: String,
    pub content: String,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl UpdateNoteInput {
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            updated_at: note.updated_at,
        }
    }
}
