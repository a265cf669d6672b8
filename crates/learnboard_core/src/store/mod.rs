//! Dashboard store and its supporting pieces.
//!
//! # Responsibility
//! - Own the topic tree, the project arena and the flat project index.
//! - Translate between dashboard models and remote documents.
//!
//! # Invariants
//! - Not-found, duplicate and invalid-input failures never mutate state.
//! - Remote failures are logged and returned; a failed remote write leaves
//!   local state unchanged.

mod codec;
mod dashboard;
mod error;
mod index;

pub use dashboard::{DashboardStore, LoadCounts, LoadOutcome};
pub use error::{StoreError, StoreErrorKind, StoreResult};
pub use index::ProjectIndex;
