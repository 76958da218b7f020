//! ENTSO-E publication-document parsing (A11 physical flows)
//!
//! The provider answers with namespaced XML: `TimeSeries` elements holding
//! `Period`s, each with an interval start, an ISO-8601 `resolution`, and a
//! list of `Point`s carrying `position`/`quantity`. Point timestamps are
//! derived as `start + (position - 1) * resolution`.
//!
//! Rejections may arrive in-band as `<Reason>` elements inside a 200
//! response. Reason code 999 ("no matching data found") is a valid empty
//! result; any other code is a permanent rejection.

use crate::{DirectedPair, FlowRecord};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Reason code the provider uses for "no matching data found".
const REASON_NO_DATA: &str = "999";

/// Errors raised while interpreting a provider document
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    /// The document is not well-formed XML
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The provider rejected the request in-band
    #[error("provider rejected the request: {code} {text}")]
    Rejected {
        /// Provider reason code
        code: String,
        /// Provider reason text
        text: String,
    },
}

#[derive(Debug, Default)]
struct Reason {
    code: String,
    text: String,
}

/// Parse an A11 document into flow records for `pair`.
///
/// An acknowledgement with reason code 999 parses to an empty vector: no
/// flow reported for the window is a valid outcome, not an error. Records
/// are returned sorted by timestamp.
pub fn parse_flow_document(
    xml: &str,
    pair: &DirectedPair,
) -> Result<Vec<FlowRecord>, ParseError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<String> = Vec::new();
    let mut records: Vec<FlowRecord> = Vec::new();
    let mut reasons: Vec<Reason> = Vec::new();

    // Current <Reason>
    let mut reason = Reason::default();
    // Current <Period>
    let mut period_start: Option<DateTime<Utc>> = None;
    let mut resolution = String::new();
    // Current <Point>
    let mut position: Option<i64> = None;
    let mut quantity: Option<f64> = None;

    loop {
        match reader.read_event() {
            Err(e) => return Err(ParseError::Malformed(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "Reason" => reason = Reason::default(),
                    "Period" => {
                        period_start = None;
                        resolution.clear();
                    }
                    "Point" => {
                        position = None;
                        quantity = None;
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Ok(Event::End(_)) => {
                let Some(name) = stack.pop() else { continue };
                match name.as_str() {
                    "Reason" => reasons.push(std::mem::take(&mut reason)),
                    "Point" => {
                        if let (Some(start), Some(mw)) = (period_start, quantity) {
                            let step = duration_minutes(&resolution).unwrap_or(60);
                            let pos = position.unwrap_or(1);
                            records.push(FlowRecord {
                                out_zone: pair.out_zone.clone(),
                                in_zone: pair.in_zone.clone(),
                                datetime_utc: start
                                    + chrono::Duration::minutes(step * (pos - 1)),
                                quantity_mw: mw,
                                resolution: if resolution.is_empty() {
                                    "PT60M".to_string()
                                } else {
                                    resolution.clone()
                                },
                            });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| ParseError::Malformed(e.to_string()))?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                let leaf = stack.last().map(String::as_str).unwrap_or("");
                let parent = stack
                    .len()
                    .checked_sub(2)
                    .map(|i| stack[i].as_str())
                    .unwrap_or("");
                match (parent, leaf) {
                    ("Reason", "code") => reason.code = text.to_string(),
                    ("Reason", "text") => reason.text = text.to_string(),
                    ("timeInterval", "start") => {
                        // Only the Period-level interval carries point timing;
                        // the document-level one is a differently named element.
                        if stack.len() >= 3 && stack[stack.len() - 3] == "Period" {
                            period_start = parse_interval_start(text);
                        }
                    }
                    ("Period", "resolution") => resolution = text.to_string(),
                    ("Point", "position") => position = text.parse().ok(),
                    ("Point", "quantity") => quantity = text.parse().ok(),
                    _ => {}
                }
            }
            Ok(_) => {}
        }
    }

    if let Some(fatal) = reasons.iter().find(|r| r.code != REASON_NO_DATA) {
        return Err(ParseError::Rejected {
            code: fatal.code.clone(),
            text: fatal.text.clone(),
        });
    }

    records.sort_by_key(|r| r.datetime_utc);
    Ok(records)
}

/// Parse an ISO-8601 duration (`PT15M`, `PT1H`, `P1D`) into minutes.
///
/// Seconds-level resolutions are not published for flows and parse to `None`.
pub(crate) fn duration_minutes(iso: &str) -> Option<i64> {
    let rest = iso.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut minutes = 0i64;
    if !date_part.is_empty() {
        minutes += date_part.strip_suffix('D')?.parse::<i64>().ok()? * 1440;
    }
    let mut t = time_part;
    if let Some(idx) = t.find('H') {
        minutes += t[..idx].parse::<i64>().ok()? * 60;
        t = &t[idx + 1..];
    }
    if let Some(idx) = t.find('M') {
        minutes += t[..idx].parse::<i64>().ok()?;
        t = &t[idx + 1..];
    }
    if !t.is_empty() {
        return None;
    }
    (minutes > 0).then_some(minutes)
}

/// Parse an interval start such as `2025-11-20T00:00Z` (minute precision,
/// the provider's usual form) or a full RFC-3339 timestamp.
fn parse_interval_start(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let stripped = s.trim_end_matches('Z');
    let naive = NaiveDateTime::parse_from_str(stripped, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(stripped, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    Some(Utc.from_utc_datetime(&naive))
}
