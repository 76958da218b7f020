//! # ENTSO-E Cross-Border Flow Downloader Library
//!
//! Fetches Cross-Border Physical Flow time series (ENTSO-E document type A11)
//! between neighboring bidding zones and persists them idempotently for later
//! analysis.
//!
//! ## Features
//!
//! - **Neighbor-pair expansion**: requested countries are expanded into their
//!   bidding-zone EIC codes and paired with every configured border neighbor,
//!   in both flow directions
//! - **Window planning**: requested ranges are split into provider-acceptable
//!   sub-windows before any request is made
//! - **Rate limiting**: a single shared pacer keeps all concurrent requests
//!   within the provider's per-token limit
//! - **Retry with backoff**: transient faults (timeouts, 429, 5xx) are retried
//!   with exponential backoff; permanent rejections are not
//! - **Idempotent storage**: flow records are upserted per
//!   `(out_zone, in_zone, timestamp)`, so overlapping runs never duplicate data
//!
//! ## Quick Start
//!
//! ```no_run
//! use entsoe_flows::catalog::ZoneCatalog;
//! use entsoe_flows::planner::{expand_directed_pairs, WindowPlan};
//! use chrono::{TimeZone, Utc};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = ZoneCatalog::load_embedded()?;
//! let countries = vec!["BG".parse()?];
//! let pairs = expand_directed_pairs(&catalog, &countries)?;
//!
//! let start = Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2025, 11, 21, 0, 0, 0).unwrap();
//! let windows = WindowPlan::split(start, end, chrono::Duration::days(365))?;
//!
//! for pair in &pairs {
//!     for window in windows.clone() {
//!         println!("{pair} {window}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several core modules:
//!
//! - [`catalog`] - Static zone catalog (country → EIC zones, border neighbors)
//! - [`planner`] - Directed-pair expansion and time-window splitting
//! - [`fetcher`] - ENTSO-E API client with pacing, retry, and XML parsing
//! - [`storage`] - Idempotent flow-record persistence (SQLite)
//! - [`downloader`] - Run orchestration over the pair × window product
//! - [`cli`] - Command-line surface

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Zone catalog (countries, EIC zones, border neighbors)
pub mod catalog;

/// CLI command implementations
pub mod cli;

/// Run orchestration
pub mod downloader;

/// ENTSO-E data fetching
pub mod fetcher;

/// Metrics instrumentation
pub mod metrics;

/// Pair expansion and window planning
pub mod planner;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Flow-record persistence
pub mod storage;

// Re-export commonly used types
pub use catalog::ZoneCatalog;

/// A bidding/control area identifier (ENTSO-E EIC code, e.g. `10YCA-BULGARIA-R`).
///
/// Zones are opaque to the core: every zone belongs to exactly one country in
/// the [`catalog::ZoneCatalog`], and flow is measured between zone pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(String);

impl Zone {
    /// Create a zone from an EIC code, trimming surrounding whitespace.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    /// The EIC code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Zone {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An ISO-3166-style two-letter country code, normalized to uppercase.
///
/// A country maps to one or more zones; multi-zone countries (e.g. DK, NO,
/// SE) split their grid into independently cleared areas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a country code. Input is trimmed and uppercased.
    ///
    /// # Errors
    ///
    /// Returns an error unless the code is exactly two ASCII letters.
    pub fn parse(s: &str) -> Result<Self, InvalidCountryCode> {
        let code = s.trim().to_uppercase();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(InvalidCountryCode(s.trim().to_string()));
        }
        Ok(Self(code))
    }

    /// The code as a string slice (always uppercase).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Error returned when a string is not a well-formed two-letter country code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid country code: {0:?} (expected two letters, e.g. \"BG\")")]
pub struct InvalidCountryCode(pub String);

impl FromStr for CountryCode {
    type Err = InvalidCountryCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = InvalidCountryCode;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CountryCode> for String {
    fn from(c: CountryCode) -> Self {
        c.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One direction of flow measurement between two zones.
///
/// Follows the A11 request naming: `out_zone` is the exporting area
/// (`out_Domain`), `in_zone` the importing area (`in_Domain`). Both
/// directions of every border edge are queried, since physical flow is
/// directionally signed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectedPair {
    /// Exporting zone (`out_Domain`)
    pub out_zone: Zone,
    /// Importing zone (`in_Domain`)
    pub in_zone: Zone,
}

impl DirectedPair {
    /// Create a directed pair.
    pub fn new(out_zone: Zone, in_zone: Zone) -> Self {
        Self { out_zone, in_zone }
    }

    /// The same border edge in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            out_zone: self.in_zone.clone(),
            in_zone: self.out_zone.clone(),
        }
    }
}

impl fmt::Display for DirectedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.out_zone, self.in_zone)
    }
}

/// A half-open UTC time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window without validating the ordering of its bounds.
    ///
    /// Validation happens in [`planner::WindowPlan::split`], which every run
    /// passes through before any request is made.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Length of the window.
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%dT%H:%MZ"),
            self.end.format("%Y-%m-%dT%H:%MZ")
        )
    }
}

/// One timestamped physical-flow measurement between a zone pair.
///
/// Uniqueness key: `(out_zone, in_zone, datetime_utc)`. Records are created
/// by the fetcher from A11 responses and mutated only by the storage upsert;
/// this core never deletes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    /// Exporting zone EIC
    pub out_zone: Zone,
    /// Importing zone EIC
    pub in_zone: Zone,
    /// Measurement timestamp (UTC)
    pub datetime_utc: DateTime<Utc>,
    /// Flow in megawatts at the timestamp
    pub quantity_mw: f64,
    /// Source resolution as an ISO-8601 duration (e.g. `PT15M`, `PT60M`)
    pub resolution: String,
}

impl FlowRecord {
    /// Validate record integrity.
    pub fn validate(&self) -> Result<(), String> {
        if self.out_zone.as_str().is_empty() {
            return Err("Out zone cannot be empty".to_string());
        }

        if self.in_zone.as_str().is_empty() {
            return Err("In zone cannot be empty".to_string());
        }

        if self.out_zone == self.in_zone {
            return Err(format!(
                "Out and in zone must differ, got {} for both",
                self.out_zone
            ));
        }

        if !self.quantity_mw.is_finite() {
            return Err(format!("Quantity must be finite, got {}", self.quantity_mw));
        }

        Ok(())
    }
}
