//! Node type and data source error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the hierarchy store
///
/// Every variant is fatal to a run: no fixtures are built from a store
/// that failed part way through.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("Failed to connect to tag database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Tag query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("Tag {id} has a malformed row: {reason}")]
    MalformedRow { id: i64, reason: String },

    #[error("Parent chain starting at tag {start} exceeds {limit} levels (cycle in parent_id?)")]
    CorruptHierarchy { start: i64, limit: usize },
}

/// One row of the hierarchy table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Row identifier
    pub id: i64,
    /// Display name, only used in diagnostics
    pub name: String,
    /// Parent row, `None` for roots
    pub parent_id: Option<i64>,
}

impl Node {
    pub fn new(id: i64, name: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }

    /// A node without a parent
    pub fn root(id: i64, name: impl Into<String>) -> Self {
        Self::new(id, name, None)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
