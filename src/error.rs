//! Failure taxonomy for the search pipeline.

use thiserror::Error;

use crate::corpus::TabletId;
use crate::storage::StorageError;

/// Errors surfaced by the search and reconstruction pipeline.
///
/// None of these are swallowed: a storage fault is never reported as an
/// empty result, and a bad pattern is never reported as a storage fault.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The storage layer is unreachable or rejected the query.
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StorageError),

    /// A tablet returned by the search step has no detail rows.
    #[error("Tablet {id} has no detail rows")]
    EmptyDocument { id: TabletId },

    /// A pattern-mode query is not a valid expression for the matcher.
    #[error("Invalid search pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Detail rows for a tablet are not grouped by object and section.
    #[error("Detail rows for tablet {id} are not grouped: {reason}")]
    UngroupedRows { id: TabletId, reason: String },
}
