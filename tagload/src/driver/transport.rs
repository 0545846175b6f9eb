//! Transport trait and reqwest-backed implementation

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a single outbound call
///
/// Never fatal to a run: the driver records them as responses.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),
}

/// Outbound GET capability used by the load driver
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `GET http://{host}{path}` and return the status code
    async fn get_path(&self, host: &str, path: &str) -> Result<u16, TransportError>;
}

/// HTTP transport with connection reuse disabled
///
/// Every call opens a fresh connection so each tick measures a full
/// connect + request cycle against the endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(0);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_path(&self, host: &str, path: &str) -> Result<u16, TransportError> {
        let url = format!("http://{}{}", host, path);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else if e.is_builder() {
                TransportError::InvalidUrl(url.clone())
            } else {
                TransportError::Request(e)
            }
        })?;
        Ok(response.status().as_u16())
    }
}
