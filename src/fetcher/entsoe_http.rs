//! ENTSO-E HTTP request loop: pacing, classification, retry with backoff
//!
//! Every attempt goes through the shared [`RateLimiter`] first. Transient
//! faults (transport errors, 429, 5xx, empty 200 bodies) are retried with
//! exponential backoff, honoring `Retry-After` when the provider sends it.
//! Other client errors are permanent; retrying them cannot succeed.

use crate::downloader::config::calculate_backoff;
use crate::downloader::rate_limit::RateLimiter;
use crate::fetcher::transport::{Transport, TransportError};
use crate::shutdown::SharedShutdown;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A request outcome, classified for the caller.
#[derive(Debug)]
pub enum RequestFault {
    /// Worth retrying; retries were exhausted (or cut short by shutdown)
    Transient(String),
    /// Retrying cannot succeed (malformed request, unknown pair, plain 4xx)
    Permanent(String),
}

/// HTTP client for the ENTSO-E transparency API.
pub struct EntsoeClient {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    shutdown: Option<SharedShutdown>,
}

impl EntsoeClient {
    /// Create a client over the given transport and shared limiter.
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        max_retries: u32,
    ) -> Self {
        Self {
            transport,
            limiter,
            max_retries,
            shutdown: None,
        }
    }

    /// Attach a shutdown handle; no retry is attempted once it fires.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_triggered())
            .unwrap_or(false)
    }

    /// Sleep for a backoff delay, aborting early when shutdown is requested.
    /// Returns false if the retry should be abandoned.
    async fn backoff_sleep(&self, delay: Duration) -> bool {
        if self.shutdown_requested() {
            return false;
        }
        match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = shutdown.wait_triggered() => false,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }

    /// Fetch one document, retrying transient faults with backoff.
    ///
    /// Returns the raw XML body on success.
    pub async fn get_document(&self, query: &[(&str, String)]) -> Result<String, RequestFault> {
        let mut last_error = String::from("no attempt made");

        for attempt in 0..=self.max_retries {
            if self.shutdown_requested() {
                return Err(RequestFault::Transient(
                    "shutdown requested before attempt".to_string(),
                ));
            }

            let waited = self.limiter.acquire().await;
            if waited > Duration::ZERO {
                debug!(waited_ms = waited.as_millis() as u64, "Paced request");
            }

            let retry_after = match self.transport.send(query).await {
                Err(fault) => {
                    last_error = fault.to_string();
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_retries + 1,
                        error = %fault,
                        "Transport fault"
                    );
                    match fault {
                        TransportError::Timeout(_) | TransportError::Connection(_) => None,
                    }
                }
                Ok(reply) => match reply.status {
                    200 => {
                        let body = reply.body;
                        if body.trim().is_empty() {
                            // The provider occasionally answers 200 with an
                            // empty body under load; treat as transient.
                            last_error = "empty 200 response".to_string();
                            None
                        } else {
                            debug!(attempt = attempt + 1, "Request succeeded");
                            return Ok(body);
                        }
                    }
                    429 => {
                        last_error = "rate limited (429)".to_string();
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.max_retries + 1,
                            retry_after = ?reply.retry_after,
                            "Rate limit response"
                        );
                        reply.retry_after
                    }
                    status if (500..600).contains(&status) => {
                        last_error = format!("server error: {status}");
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.max_retries + 1,
                            status,
                            "Server error"
                        );
                        reply.retry_after
                    }
                    status => {
                        let snippet: String = reply.body.chars().take(200).collect();
                        return Err(RequestFault::Permanent(format!(
                            "client error {status}: {snippet}"
                        )));
                    }
                },
            };

            if attempt < self.max_retries {
                crate::metrics::record_retry();
                let delay = retry_after
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| calculate_backoff(attempt));
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after backoff");
                if !self.backoff_sleep(delay).await {
                    return Err(RequestFault::Transient(format!(
                        "shutdown requested during backoff (last error: {last_error})"
                    )));
                }
            }
        }

        Err(RequestFault::Transient(format!(
            "retries exhausted: {last_error}"
        )))
    }
}
