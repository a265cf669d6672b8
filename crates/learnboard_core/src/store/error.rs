//! Store error taxonomy.

use crate::remote::RemoteError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse error category used by callers deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Referenced topic/project/note is absent.
    NotFound,
    /// Creation collided with an existing identity.
    Duplicate,
    /// Caller input cannot be turned into a valid identity.
    InvalidInput,
    /// Remote document store failed.
    Remote,
}

/// Errors returned by dashboard store actions.
///
/// Every variant except `Remote` is raised before any remote write or local
/// mutation happens.
#[derive(Debug)]
pub enum StoreError {
    /// Topic name is blank or yields an unusable ID.
    InvalidTopicName(String),
    /// An ID cannot be placed in a remote document path.
    InvalidDocumentId(String),
    TopicNotFound(String),
    ProjectNotFound(String),
    /// Project exists but is owned by another topic.
    ProjectOwnerMismatch {
        project_id: String,
        expected_topic: String,
        actual_topic: String,
    },
    NoteIndexOutOfRange {
        project_id: String,
        index: usize,
        len: usize,
    },
    /// A topic with the derived ID already exists.
    DuplicateTopic(String),
    /// A project with this ID exists somewhere in the tree.
    DuplicateProject(String),
    DuplicateNote {
        project_id: String,
        note_id: String,
    },
    Remote(RemoteError),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::InvalidTopicName(_) | Self::InvalidDocumentId(_) => StoreErrorKind::InvalidInput,
            Self::TopicNotFound(_)
            | Self::ProjectNotFound(_)
            | Self::ProjectOwnerMismatch { .. }
            | Self::NoteIndexOutOfRange { .. } => StoreErrorKind::NotFound,
            Self::DuplicateTopic(_) | Self::DuplicateProject(_) | Self::DuplicateNote { .. } => {
                StoreErrorKind::Duplicate
            }
            Self::Remote(_) => StoreErrorKind::Remote,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTopicName(name) => write!(f, "invalid topic name: `{name}`"),
            Self::InvalidDocumentId(path) => write!(f, "unusable document path: `{path}`"),
            Self::TopicNotFound(id) => write!(f, "topic not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::ProjectOwnerMismatch {
                project_id,
                expected_topic,
                actual_topic,
            } => write!(
                f,
                "project {project_id} belongs to topic {actual_topic}, not {expected_topic}"
            ),
            Self::NoteIndexOutOfRange {
                project_id,
                index,
                len,
            } => write!(
                f,
                "note index {index} out of range for project {project_id} with {len} notes"
            ),
            Self::DuplicateTopic(id) => write!(f, "topic already exists: {id}"),
            Self::DuplicateProject(id) => write!(f, "project already exists: {id}"),
            Self::DuplicateNote {
                project_id,
                note_id,
            } => write!(f, "note {note_id} already exists in project {project_id}"),
            Self::Remote(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteError> for StoreError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::InvalidPath(path) => Self::InvalidDocumentId(path),
            other => Self::Remote(other),
        }
    }
}
