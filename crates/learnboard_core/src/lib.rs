//! Core data layer for the learning dashboard.
//!
//! Keeps a Topic → Project → Note tree in memory and mirrors every mutation
//! into an optional hierarchical document store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod remote;
pub mod store;

pub use config::{ConfigError, DashboardConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::note::{Note, NoteId};
pub use model::project::{Project, ProjectPatch, ProjectStatus, UnknownStatus};
pub use model::topic::{topic_id_from_name, Topic, TopicPatch, TopicRecord};
pub use remote::{
    CollectionPath, Direction, Document, DocumentPath, DocumentStore, Fields, InMemoryDocumentStore,
    OrderBy, RemoteError, RemoteResult, SqliteDocumentStore,
};
pub use store::{
    DashboardStore, LoadCounts, LoadOutcome, ProjectIndex, StoreError, StoreErrorKind,
    StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
