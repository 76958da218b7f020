//! Network transport seam
//!
//! The fetcher only constructs requests and interprets replies; connection
//! pooling, TLS, and timeouts live behind the [`Transport`] trait. Production
//! uses [`ReqwestTransport`] over a process-wide HTTP client; tests inject
//! scripted transports.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// HTTP connect timeout (seconds) - time to establish the TCP connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds) - overall time for the entire request
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 45;

/// Global HTTP client shared by all fetcher instances.
///
/// Configured with explicit timeouts so a stalled provider cannot hang a
/// worker indefinitely.
static GLOBAL_HTTP_CLIENT: Lazy<Arc<Client>> = Lazy::new(|| {
    Arc::new(
        Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                panic!("FATAL: Failed to build HTTP client: {e}. Check system TLS configuration.");
            }),
    )
});

/// Get the global HTTP client (cheap: clones an `Arc`).
pub fn global_http_client() -> Arc<Client> {
    GLOBAL_HTTP_CLIENT.clone()
}

/// A provider reply, reduced to what retry classification needs.
#[derive(Debug, Clone)]
pub struct TransportReply {
    /// HTTP status code
    pub status: u16,
    /// `Retry-After` header in seconds, when present
    pub retry_after: Option<u64>,
    /// Response body (XML document or error text)
    pub body: String,
}

/// Faults raised below the HTTP status layer. Always transient.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Request or connect deadline exceeded
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure
    #[error("connection error: {0}")]
    Connection(String),
}

/// Sends one query to the provider and returns the raw reply.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one GET with the given query parameters.
    async fn send(&self, query: &[(&str, String)]) -> Result<TransportReply, TransportError>;
}

/// Production transport over `reqwest`.
pub struct ReqwestTransport {
    client: Arc<Client>,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a transport for the given endpoint URL, using the shared client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: global_http_client(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, query: &[(&str, String)]) -> Result<TransportReply, TransportError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(e.to_string())
                } else {
                    TransportError::Connection(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(TransportReply {
            status,
            retry_after,
            body,
        })
    }
}
