//! HierarchyStore trait definition

use async_trait::async_trait;

use super::types::{DataSourceError, Node};

/// Trait for hierarchy sources (MySQL `tags` table or in-memory)
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    /// List every node of the given category
    async fn nodes_of_category(&self, category: &str) -> Result<Vec<Node>, DataSourceError>;

    /// Get the parent of a node
    ///
    /// Returns `Ok(None)` both for roots and for parent ids that do not
    /// resolve to a row; only a failed lookup is an error.
    async fn parent_of(&self, node: &Node) -> Result<Option<Node>, DataSourceError>;
}
