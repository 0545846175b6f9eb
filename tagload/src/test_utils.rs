//! Test Utilities Module
//!
//! Provides node builders, scripted stores, and scripted transports for
//! unit tests. This module is only compiled when running tests.

#![cfg(test)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{Transport, TransportError};
use crate::hierarchy::{DataSourceError, HierarchyStore, MemoryHierarchyStore, Node};

// ============================================================================
// Hierarchy fixtures
// ============================================================================

/// Node named after its id
pub fn node(id: i64, parent_id: Option<i64>) -> Node {
    Node::new(id, format!("tag-{}", id), parent_id)
}

/// Linear chain `root_id <- root_id+1 <- ... <- root_id+depth`
///
/// The root carries no category; every descendant is in `category`.
pub fn chain_store(category: &str, root_id: i64, depth: i64) -> MemoryHierarchyStore {
    let mut store = MemoryHierarchyStore::new();
    store.insert(node(root_id, None));
    for id in root_id + 1..=root_id + depth {
        store.insert_in(category, node(id, Some(id - 1)));
    }
    store
}

/// Store whose parent lookups succeed `n` times, then fail like a timed-out pool
///
/// Successful lookups invent a parent one id above the child, so chains
/// only end through the failure.
pub struct FailingStore {
    remaining: AtomicUsize,
}

impl FailingStore {
    pub fn after(n: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(n),
        }
    }
}

#[async_trait]
impl HierarchyStore for FailingStore {
    async fn nodes_of_category(&self, _category: &str) -> Result<Vec<Node>, DataSourceError> {
        Err(DataSourceError::Query(sqlx::Error::PoolClosed))
    }

    async fn parent_of(&self, node: &Node) -> Result<Option<Node>, DataSourceError> {
        let left = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match (left, node.parent_id) {
            (Err(_), _) => Err(DataSourceError::Query(sqlx::Error::PoolTimedOut)),
            (Ok(_), Some(parent_id)) => Ok(Some(self::node(parent_id, Some(parent_id + 1)))),
            (Ok(_), None) => Ok(None),
        }
    }
}

// ============================================================================
// Transport fixtures
// ============================================================================

enum Scripted {
    Status(u16),
    Fail,
}

/// Transport returning a fixed outcome after a scripted delay
///
/// Delays cycle through the configured list, one entry per call, so tests
/// can force completions out of issue order.
pub struct ScriptedTransport {
    outcome: Scripted,
    delays: Vec<Duration>,
    calls: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn ok(status: u16) -> Self {
        Self::with_outcome(Scripted::Status(status))
    }

    pub fn failing() -> Self {
        Self::with_outcome(Scripted::Fail)
    }

    fn with_outcome(outcome: Scripted) -> Self {
        Self {
            outcome,
            delays: Vec::new(),
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delays(mut self, delays: Vec<Duration>) -> Self {
        self.delays = delays;
        self
    }

    /// Paths requested so far, in issue order
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_path(&self, _host: &str, path: &str) -> Result<u16, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(path.to_string());

        if !self.delays.is_empty() {
            tokio::time::sleep(self.delays[call % self.delays.len()]).await;
        }

        match self.outcome {
            Scripted::Status(status) => Ok(status),
            Scripted::Fail => Err(TransportError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chain_store_shape() {
        let store = chain_store("topic", 10, 2);
        let bases = store.nodes_of_category("topic").await.unwrap();
        let ids: Vec<i64> = bases.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![11, 12]);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_failing_store_counts_down() {
        let store = FailingStore::after(1);
        let child = node(1, Some(2));

        let parent = store.parent_of(&child).await.unwrap().unwrap();
        assert_eq!(parent.id, 2);
        assert!(store.parent_of(&parent).await.is_err());
    }

    #[tokio::test]
    async fn test_scripted_transport_records_paths() {
        let transport = ScriptedTransport::ok(201);
        assert_eq!(transport.get_path("h", "/a").await.unwrap(), 201);
        assert_eq!(transport.paths(), vec!["/a".to_string()]);

        let failing = ScriptedTransport::failing();
        assert!(failing.get_path("h", "/b").await.is_err());
    }
}
