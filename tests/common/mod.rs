//! Shared fixtures: scripted transports and fetchers, XML builders

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use entsoe_flows::fetcher::transport::{Transport, TransportError, TransportReply};
use entsoe_flows::fetcher::{FetchError, FetchResult, FlowFetcher};
use entsoe_flows::{DirectedPair, FlowRecord, TimeWindow, Zone};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A canned reply sequence standing in for the provider.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<TransportReply, TransportError>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<TransportReply, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _query: &[(&str, String)]) -> Result<TransportReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .expect("script lock")
            .pop_front()
            .expect("transport script exhausted")
    }
}

/// 200 reply wrapping a body
pub fn ok_reply(body: impl Into<String>) -> Result<TransportReply, TransportError> {
    Ok(TransportReply {
        status: 200,
        retry_after: None,
        body: body.into(),
    })
}

/// Status-only reply (e.g. 429, 503)
pub fn status_reply(status: u16, retry_after: Option<u64>) -> Result<TransportReply, TransportError> {
    Ok(TransportReply {
        status,
        retry_after,
        body: String::new(),
    })
}

/// Transport-level timeout
pub fn timeout_reply() -> Result<TransportReply, TransportError> {
    Err(TransportError::Timeout("deadline exceeded".to_string()))
}

/// Window start used across fixtures: 2025-11-20T00:00Z
pub fn fixture_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap()
}

/// The 24-hour fixture window
pub fn fixture_window() -> TimeWindow {
    TimeWindow::new(fixture_start(), fixture_start() + Duration::hours(24))
}

pub fn bg_ro_pair() -> DirectedPair {
    DirectedPair::new(
        Zone::from("10YCA-BULGARIA-R"),
        Zone::from("10YRO-TEL------P"),
    )
}

/// Build a well-formed A11 publication document with hourly points.
pub fn flow_document(pair: &DirectedPair, start: DateTime<Utc>, quantities: &[f64]) -> String {
    let points: String = quantities
        .iter()
        .enumerate()
        .map(|(i, q)| {
            format!(
                "<Point><position>{}</position><quantity>{q}</quantity></Point>",
                i + 1
            )
        })
        .collect();
    let start_str = start.format("%Y-%m-%dT%H:%MZ");
    let end_str = (start + Duration::hours(quantities.len() as i64)).format("%Y-%m-%dT%H:%MZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Publication_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:3">
  <mRID>fixture</mRID>
  <type>A11</type>
  <TimeSeries>
    <mRID>1</mRID>
    <out_Domain.mRID codingScheme="A01">{out}</out_Domain.mRID>
    <in_Domain.mRID codingScheme="A01">{inn}</in_Domain.mRID>
    <Period>
      <timeInterval>
        <start>{start_str}</start>
        <end>{end_str}</end>
      </timeInterval>
      <resolution>PT60M</resolution>
      {points}
    </Period>
  </TimeSeries>
</Publication_MarketDocument>"#,
        out = pair.out_zone,
        inn = pair.in_zone,
    )
}

/// Acknowledgement document meaning "no matching data found".
pub fn no_data_document() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<Acknowledgement_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:8:1">
  <Reason>
    <code>999</code>
    <text>No matching data found for the request</text>
  </Reason>
</Acknowledgement_MarketDocument>"#
        .to_string()
}

/// What a [`ScriptedFetcher`] does for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchBehavior {
    /// Produce one hourly record per hour of the window
    Succeed,
    /// Produce no records (valid empty window)
    Empty,
    /// Fail as if retries were exhausted
    FailTransient,
    /// Fail as a permanent provider rejection
    Reject,
}

/// Deterministic in-process fetcher for orchestration tests.
pub struct ScriptedFetcher {
    default: FetchBehavior,
    overrides: Vec<(DirectedPair, FetchBehavior)>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(default: FetchBehavior) -> Self {
        Self {
            default,
            overrides: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_override(mut self, pair: DirectedPair, behavior: FetchBehavior) -> Self {
        self.overrides.push((pair, behavior));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn behavior_for(&self, pair: &DirectedPair) -> FetchBehavior {
        self.overrides
            .iter()
            .find(|(p, _)| p == pair)
            .map(|(_, b)| *b)
            .unwrap_or(self.default)
    }
}

/// One record per full hour of the window, quantity derived from the hour.
pub fn hourly_records(pair: &DirectedPair, window: &TimeWindow) -> Vec<FlowRecord> {
    let hours = window.duration().num_hours();
    (0..hours)
        .map(|h| FlowRecord {
            out_zone: pair.out_zone.clone(),
            in_zone: pair.in_zone.clone(),
            datetime_utc: window.start + Duration::hours(h),
            quantity_mw: 100.0 + h as f64,
            resolution: "PT60M".to_string(),
        })
        .collect()
}

#[async_trait]
impl FlowFetcher for ScriptedFetcher {
    async fn fetch(&self, pair: &DirectedPair, window: &TimeWindow) -> FetchResult<Vec<FlowRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior_for(pair) {
            FetchBehavior::Succeed => Ok(hourly_records(pair, window)),
            FetchBehavior::Empty => Ok(Vec::new()),
            FetchBehavior::FailTransient => Err(FetchError::Failed {
                pair: pair.clone(),
                window: *window,
                cause: "retries exhausted: request timed out".to_string(),
            }),
            FetchBehavior::Reject => Err(FetchError::Rejected {
                pair: pair.clone(),
                window: *window,
                cause: "client error 400: unknown domain pair".to_string(),
            }),
        }
    }
}
