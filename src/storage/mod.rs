//! Storage backend trait and implementations.
//!
//! The search pipeline only talks to storage through [`StorageBackend`], so
//! the query builder and tree reconstruction can be tested without a
//! database. [`sqlite::SqliteStorage`] is the production backend.

pub mod sqlite;

use crate::corpus::{DetailRow, TabletId};
use crate::search::ScoredMatch;
use crate::search::query::{CountRequest, QueryDescriptor};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to open database {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Failed to write: {0}")]
    WriteError(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Query(e.to_string())
    }
}

/// Trait for storage backends holding the tablet corpus.
pub trait StorageBackend {
    /// Run the page query of a descriptor, returning tablet ids in order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query cannot be executed.
    fn fetch_matches(&self, descriptor: &QueryDescriptor) -> Result<Vec<ScoredMatch>, StorageError>;

    /// Count all tablets matching a filter, ignoring pagination.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the count cannot be executed.
    fn count_matches(&self, request: CountRequest<'_>) -> Result<u64, StorageError>;

    /// Fetch every (object, section, line) row of a tablet in storage order.
    ///
    /// Rows are grouped by object, and by section within an object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the rows cannot be fetched.
    fn fetch_rows(&self, id: TabletId) -> Result<Vec<DetailRow>, StorageError>;

    /// Check that `pattern` is accepted by this backend's pattern matcher.
    ///
    /// # Errors
    ///
    /// Returns the matcher's explanation when the pattern is invalid.
    fn check_pattern(&self, pattern: &str) -> Result<(), String>;
}
