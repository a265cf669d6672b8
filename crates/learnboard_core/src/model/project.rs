//! Project model and status lifecycle.
//!
//! # Invariants
//! - `status` is always one of the three known variants; unknown wire values
//!   are coerced to `NotStarted` on load.
//! - `end_date` is either absent or a string; it is never an empty sentinel.

use crate::model::note::Note;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Project lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl ProjectStatus {
    /// Returns the wire form (`not-started|in-progress|completed`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Lenient parse used for persisted data: anything unknown is `NotStarted`.
    pub fn coerce(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict status parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl Display for UnknownStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown project status `{}`; expected not-started|in-progress|completed",
            self.0
        )
    }
}

impl Error for UnknownStatus {}

impl FromStr for ProjectStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "not-started" => Ok(Self::NotStarted),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Unit of learning work nested under a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique across the whole dashboard.
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    /// ISO date.
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Project {
    /// Creates a not-started project with no end date and no notes.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start_date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status: ProjectStatus::NotStarted,
            start_date: start_date.into(),
            end_date: None,
            notes: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProjectStatus::Completed
    }

    /// Remote document fields for this project. Notes live in a subcollection.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("title".to_string(), Value::from(self.title.as_str()));
        fields.insert(
            "description".to_string(),
            Value::from(self.description.as_str()),
        );
        fields.insert("status".to_string(), Value::from(self.status.as_str()));
        fields.insert(
            "startDate".to_string(),
            Value::from(self.start_date.as_str()),
        );
        fields.insert(
            "endDate".to_string(),
            self.end_date.as_deref().map_or(Value::Null, Value::from),
        );
        fields
    }
}

/// Partial project update. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<String>,
    /// `Some(None)` clears the end date.
    pub end_date: Option<Option<String>>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    /// Remote field map containing only the fields this patch sets.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(title) = &self.title {
            fields.insert("title".to_string(), Value::from(title.as_str()));
        }
        if let Some(description) = &self.description {
            fields.insert(
                "description".to_string(),
                Value::from(description.as_str()),
            );
        }
        if let Some(status) = self.status {
            fields.insert("status".to_string(), Value::from(status.as_str()));
        }
        if let Some(start_date) = &self.start_date {
            fields.insert("startDate".to_string(), Value::from(start_date.as_str()));
        }
        if let Some(end_date) = &self.end_date {
            fields.insert(
                "endDate".to_string(),
                end_date.as_deref().map_or(Value::Null, Value::from),
            );
        }
        fields
    }

    /// Merges the set fields into `project` in place.
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title = title.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(start_date) = &self.start_date {
            project.start_date = start_date.clone();
        }
        if let Some(end_date) = &self.end_date {
            project.end_date = end_date.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Project, ProjectPatch, ProjectStatus};
    use serde_json::Value;

    #[test]
    fn coerce_falls_back_to_not_started() {
        assert_eq!(ProjectStatus::coerce("completed"), ProjectStatus::Completed);
        assert_eq!(ProjectStatus::coerce("in-progress"), ProjectStatus::InProgress);
        assert_eq!(ProjectStatus::coerce("done"), ProjectStatus::NotStarted);
        assert_eq!(ProjectStatus::coerce(""), ProjectStatus::NotStarted);
    }

    #[test]
    fn strict_parse_rejects_unknown_values() {
        let err = "Completed".parse::<ProjectStatus>().unwrap_err();
        assert!(err.to_string().contains("Completed"));
    }

    #[test]
    fn status_serializes_in_kebab_case() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn patch_fields_contain_only_set_values() {
        let patch = ProjectPatch {
            title: Some("Renamed".to_string()),
            end_date: Some(None),
            ..ProjectPatch::default()
        };
        let fields = patch.to_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["title"], Value::from("Renamed"));
        assert_eq!(fields["endDate"], Value::Null);
    }

    #[test]
    fn patch_apply_leaves_unset_fields_untouched() {
        let mut project = Project::new("p1", "Graphs", "2024-01-01");
        project.end_date = Some("2024-03-01".to_string());
        let patch = ProjectPatch {
            status: Some(ProjectStatus::Completed),
            ..ProjectPatch::default()
        };
        patch.apply_to(&mut project);
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.title, "Graphs");
        assert_eq!(project.end_date.as_deref(), Some("2024-03-01"));
    }
}
