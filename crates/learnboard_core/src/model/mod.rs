//! Dashboard domain model: topics, projects and notes.
//!
//! # Responsibility
//! - Define the canonical shapes exchanged with callers and the remote store.
//! - Provide typed partial updates and the small validation helpers they need.
//!
//! # Invariants
//! - Project IDs are unique across the whole tree, not just within a topic.
//! - Every note carries a stable `NoteId` assigned at creation time.

pub mod note;
pub mod project;
pub mod topic;
