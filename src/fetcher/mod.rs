//! Flow data fetching from the ENTSO-E transparency platform
//!
//! One request is issued per `(pair, window)`. The fetcher owns request
//! construction and response interpretation only; pacing and retry live in
//! [`entsoe_http`], the wire format in [`entsoe_parser`], and raw I/O behind
//! the [`transport::Transport`] seam. The fetcher never touches storage.

use crate::downloader::rate_limit::RateLimiter;
use crate::shutdown::SharedShutdown;
use crate::{DirectedPair, FlowRecord, TimeWindow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod entsoe_http;
pub mod entsoe_parser;
pub mod transport;

use entsoe_http::{EntsoeClient, RequestFault};
use entsoe_parser::ParseError;
use transport::{ReqwestTransport, Transport};

/// ENTSO-E transparency platform endpoint.
pub const ENTSOE_API_URL: &str = "https://web-api.tp.entsoe.eu/api";

/// Document type for cross-border physical flows.
const DOCUMENT_TYPE_FLOWS: &str = "A11";

/// Fetch errors, classified by what the orchestrator should do with them
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Permanent provider rejection; retrying cannot succeed
    #[error("fetch rejected for {pair} {window}: {cause}")]
    Rejected {
        /// Pair being queried
        pair: DirectedPair,
        /// Window being queried
        window: TimeWindow,
        /// Underlying cause
        cause: String,
    },

    /// Transient failure that survived the retry ceiling
    #[error("fetch failed for {pair} {window}: {cause}")]
    Failed {
        /// Pair being queried
        pair: DirectedPair,
        /// Window being queried
        window: TimeWindow,
        /// Underlying cause
        cause: String,
    },
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Fetches the flow series for one directed pair over one window.
#[async_trait]
pub trait FlowFetcher: Send + Sync {
    /// Fetch all flow records for `(pair, window)`.
    ///
    /// An empty vector is a valid result: the provider reported no flow for
    /// the window.
    async fn fetch(&self, pair: &DirectedPair, window: &TimeWindow) -> FetchResult<Vec<FlowRecord>>;
}

/// Format a timestamp the way the provider expects (`yyyyMMddHHmm`, UTC).
fn to_utc_compact(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%d%H%M").to_string()
}

/// Production fetcher for A11 cross-border physical flows.
pub struct EntsoeFlowFetcher {
    client: EntsoeClient,
    token: String,
}

impl EntsoeFlowFetcher {
    /// Create a fetcher against the public API endpoint.
    pub fn new(token: impl Into<String>, limiter: Arc<RateLimiter>, max_retries: u32) -> Self {
        Self::with_transport(
            Arc::new(ReqwestTransport::new(ENTSOE_API_URL)),
            token,
            limiter,
            max_retries,
        )
    }

    /// Create a fetcher over an injected transport (used by tests).
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        token: impl Into<String>,
        limiter: Arc<RateLimiter>,
        max_retries: u32,
    ) -> Self {
        Self {
            client: EntsoeClient::new(transport, limiter, max_retries),
            token: token.into(),
        }
    }

    /// Attach a shutdown handle; no retry is attempted once it fires.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.client = self.client.with_shutdown(shutdown);
        self
    }

    fn query(&self, pair: &DirectedPair, window: &TimeWindow) -> Vec<(&'static str, String)> {
        vec![
            ("documentType", DOCUMENT_TYPE_FLOWS.to_string()),
            ("out_Domain", pair.out_zone.to_string()),
            ("in_Domain", pair.in_zone.to_string()),
            ("periodStart", to_utc_compact(window.start)),
            ("periodEnd", to_utc_compact(window.end)),
            ("securityToken", self.token.clone()),
        ]
    }
}

#[async_trait]
impl FlowFetcher for EntsoeFlowFetcher {
    async fn fetch(&self, pair: &DirectedPair, window: &TimeWindow) -> FetchResult<Vec<FlowRecord>> {
        let query = self.query(pair, window);

        let body = self.client.get_document(&query).await.map_err(|fault| {
            match fault {
                RequestFault::Transient(cause) => FetchError::Failed {
                    pair: pair.clone(),
                    window: *window,
                    cause,
                },
                RequestFault::Permanent(cause) => FetchError::Rejected {
                    pair: pair.clone(),
                    window: *window,
                    cause,
                },
            }
        })?;

        entsoe_parser::parse_flow_document(&body, pair).map_err(|e| match e {
            // A rejection surfaced in-band or an unreadable 200 both mean the
            // request itself is bad for this pair; retrying cannot help.
            ParseError::Rejected { .. } | ParseError::Malformed(_) => FetchError::Rejected {
                pair: pair.clone(),
                window: *window,
                cause: e.to_string(),
            },
        })
    }
}
