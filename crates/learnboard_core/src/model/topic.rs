//! Topic model and slug derivation.
//!
//! # Invariants
//! - Topic IDs derived from names are lowercase with whitespace runs
//!   collapsed into single hyphens.
//! - A stored `TopicRecord` references projects by ID only; the projects
//!   themselves live in the dashboard's project arena.

use crate::model::project::Project;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Owned nested topic shape used for seeding and tree snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Topic {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            projects: Vec::new(),
        }
    }

    /// Remote document fields for this topic. Projects live in a subcollection.
    pub fn to_fields(&self) -> Map<String, Value> {
        topic_fields(&self.name)
    }
}

/// Stored topic: identity, display name and ordered project IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRecord {
    pub id: String,
    pub name: String,
    pub project_ids: Vec<String>,
}

impl TopicRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            project_ids: Vec::new(),
        }
    }
}

/// Partial topic update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicPatch {
    pub name: Option<String>,
}

impl TopicPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn to_fields(&self) -> Map<String, Value> {
        match &self.name {
            Some(name) => topic_fields(name),
            None => Map::new(),
        }
    }

    pub fn apply_to(&self, topic: &mut TopicRecord) {
        if let Some(name) = &self.name {
            topic.name = name.clone();
        }
    }
}

/// Derives a topic ID from a display name.
///
/// Returns `None` when the name is blank.
pub fn topic_id_from_name(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return None;
    }
    let lowered = name.to_lowercase();
    Some(WHITESPACE_RUN_RE.replace_all(&lowered, "-").into_owned())
}

pub(crate) fn topic_fields(name: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("name".to_string(), Value::from(name));
    fields
}

#[cfg(test)]
mod tests {
    use super::topic_id_from_name;

    #[test]
    fn id_is_lowercased_and_hyphenated() {
        assert_eq!(
            topic_id_from_name("Data Structures").as_deref(),
            Some("data-structures")
        );
        assert_eq!(
            topic_id_from_name("data   structures\tand Algos").as_deref(),
            Some("data-structures-and-algos")
        );
    }

    #[test]
    fn blank_names_have_no_id() {
        assert_eq!(topic_id_from_name(""), None);
        assert_eq!(topic_id_from_name("   "), None);
    }

    #[test]
    fn surrounding_whitespace_becomes_hyphens() {
        assert_eq!(topic_id_from_name(" Rust ").as_deref(), Some("-rust-"));
    }
}
