//! In-memory hierarchy store

use std::collections::HashMap;

use async_trait::async_trait;

use super::store::HierarchyStore;
use super::types::{DataSourceError, Node};

/// Hierarchy held in a `HashMap`, keyed by node id
///
/// Nodes without a category are still reachable as parents but are never
/// returned by `nodes_of_category`.
#[derive(Debug, Clone, Default)]
pub struct MemoryHierarchyStore {
    nodes: HashMap<i64, Node>,
    categories: HashMap<i64, String>,
}

impl MemoryHierarchyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node that only serves as an ancestor
    pub fn insert(&mut self, node: Node) {
        self.categories.remove(&node.id);
        self.nodes.insert(node.id, node);
    }

    /// Insert a node tagged with a category
    pub fn insert_in(&mut self, category: impl Into<String>, node: Node) {
        self.categories.insert(node.id, category.into());
        self.nodes.insert(node.id, node);
    }

    /// Builder-style `insert_in`
    pub fn with_node(mut self, category: Option<&str>, node: Node) -> Self {
        match category {
            Some(category) => self.insert_in(category, node),
            None => self.insert(node),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[async_trait]
impl HierarchyStore for MemoryHierarchyStore {
    async fn nodes_of_category(&self, category: &str) -> Result<Vec<Node>, DataSourceError> {
        let mut nodes: Vec<Node> = self
            .categories
            .iter()
            .filter(|(_, c)| c.as_str() == category)
            .filter_map(|(id, _)| self.nodes.get(id).cloned())
            .collect();
        // HashMap iteration order is unstable; keep results reproducible for seeded runs
        nodes.sort_by_key(|n| n.id);
        Ok(nodes)
    }

    async fn parent_of(&self, node: &Node) -> Result<Option<Node>, DataSourceError> {
        Ok(node
            .parent_id
            .and_then(|parent_id| self.nodes.get(&parent_id).cloned()))
    }
}
