//! Note model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable note identifier, also used as the remote document ID.
pub type NoteId = String;

/// Dated free-text entry nested under one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Assigned once; a note keeps its ID across content updates.
    #[serde(default = "new_note_id")]
    pub id: NoteId,
    pub date: String,
    pub content: String,
}

impl Note {
    /// Creates a note with a freshly generated ID.
    pub fn new(date: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(new_note_id(), date, content)
    }

    /// Creates a note with a caller-provided ID.
    ///
    /// Used by load paths where identity already exists remotely.
    pub fn with_id(
        id: impl Into<NoteId>,
        date: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            content: content.into(),
        }
    }
}

/// Generates a new random note ID.
pub fn new_note_id() -> NoteId {
    Uuid::new_v4().to_string()
}
