//! Conversion between remote documents and dashboard models.
//!
//! # Invariants
//! - Decoding never fails: scalar fields are coerced to strings, unknown
//!   statuses become `NotStarted`, and `endDate` is absent unless it holds a
//!   non-null value.

use crate::model::note::Note;
use crate::model::project::{Project, ProjectStatus};
use crate::remote::{Document, Fields};
use serde_json::Value;

/// Topic display name, falling back to the topic ID when missing or null.
pub fn decode_topic_name(doc: &Document) -> String {
    match doc.fields.get("name") {
        None | Some(Value::Null) => doc.id.clone(),
        Some(value) => coerce_string(Some(value)),
    }
}

/// Builds a project from its document and already-decoded notes.
pub fn decode_project(doc: &Document, notes: Vec<Note>) -> Project {
    let status = match doc.fields.get("status") {
        Some(Value::String(raw)) => ProjectStatus::coerce(raw),
        _ => ProjectStatus::NotStarted,
    };
    Project {
        id: doc.id.clone(),
        title: coerce_string(doc.fields.get("title")),
        description: coerce_string(doc.fields.get("description")),
        status,
        start_date: coerce_string(doc.fields.get("startDate")),
        end_date: coerce_optional_string(doc.fields.get("endDate")),
        notes,
    }
}

/// Builds a note whose ID is the remote document ID.
pub fn decode_note(doc: &Document) -> Note {
    Note::with_id(
        doc.id.clone(),
        coerce_string(doc.fields.get("date")),
        coerce_string(doc.fields.get("content")),
    )
}

/// Remote fields for a note. The ID is the document ID, not a field.
pub fn note_fields(note: &Note) -> Fields {
    let mut fields = Fields::new();
    fields.insert("date".to_string(), Value::from(note.date.as_str()));
    fields.insert("content".to_string(), Value::from(note.content.as_str()));
    fields
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(other) => other.to_string(),
    }
}

fn coerce_optional_string(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        other => Some(coerce_string(other)),
    }
}
