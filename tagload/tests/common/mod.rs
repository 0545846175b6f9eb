//! Common Test Utilities for Integration Tests
//!
//! Shared helpers used across integration test modules.

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tagload::config::EndpointConfig;
use tagload::{MemoryHierarchyStore, Node};
use tokio::task::JoinHandle;

type Hits = Arc<Mutex<Vec<String>>>;

/// Local HTTP server standing in for the endpoint under load
pub struct TestServer {
    pub addr: SocketAddr,
    hits: Hits,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// `tags` query values received so far, decoded
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn endpoint(&self, path: &str) -> EndpointConfig {
        EndpointConfig {
            hostname: self.addr.to_string(),
            path: path.to_string(),
            request_timeout_secs: Some(5),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn items(
    State(hits): State<Hits>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    hits.lock()
        .unwrap()
        .push(params.get("tags").cloned().unwrap_or_default());
    StatusCode::OK
}

async fn broken() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

/// Start a server on an ephemeral port
///
/// - `/api/items?tags=...` records the tags and returns 200
/// - `/api/broken?tags=...` returns 503
pub async fn spawn_test_server() -> TestServer {
    let hits: Hits = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/api/items", get(items))
        .route("/api/broken", get(broken))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer { addr, hits, handle }
}

/// An address nothing listens on
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Small two-category tag forest
///
/// ```text
/// 10 Science            40 Europe (region)
/// └── 20 Physics        └── 41 France (region)
///     ├── 30 Optics (topic)
///     └── 31 Acoustics (topic)
/// 32 Philosophy (topic, root)
/// ```
pub fn tag_forest() -> MemoryHierarchyStore {
    MemoryHierarchyStore::new()
        .with_node(None, Node::root(10, "Science"))
        .with_node(None, Node::new(20, "Physics", Some(10)))
        .with_node(Some("topic"), Node::new(30, "Optics", Some(20)))
        .with_node(Some("topic"), Node::new(31, "Acoustics", Some(20)))
        .with_node(Some("topic"), Node::root(32, "Philosophy"))
        .with_node(Some("region"), Node::root(40, "Europe"))
        .with_node(Some("region"), Node::new(41, "France", Some(40)))
}

/// Initialize test logging for detailed output
pub fn init_test_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagload=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
