//! Time-window splitting
//!
//! The provider rejects requests whose span exceeds a fixed maximum, so a
//! requested `[start, end)` range is cut into chronological sub-windows of
//! at most that span before fetching. Splitting is independent of pair
//! identity: one plan is computed per run and re-iterated for every pair.

use crate::TimeWindow;
use chrono::{DateTime, Duration, Utc};

/// Errors raised while planning a run's time windows
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The requested range is empty or inverted
    #[error("invalid range: end ({end}) must be after start ({start})")]
    InvalidRange {
        /// Requested start
        start: DateTime<Utc>,
        /// Requested end
        end: DateTime<Utc>,
    },

    /// The configured maximum span is not positive
    #[error("invalid maximum window span: {0}")]
    InvalidSpan(String),
}

/// A lazy, restartable plan of sub-windows covering `[start, end)`.
///
/// Iterating yields half-open [`TimeWindow`]s in chronological order with no
/// gaps and no overlaps; every window spans at most the configured maximum,
/// and only the final one may be shorter. The plan is `Clone`, so it can be
/// replayed once per pair.
#[derive(Debug, Clone)]
pub struct WindowPlan {
    cursor: DateTime<Utc>,
    end: DateTime<Utc>,
    max_span: Duration,
}

impl WindowPlan {
    /// Split `[start, end)` into sub-windows of at most `max_span`.
    ///
    /// # Errors
    ///
    /// `InvalidRange` if `end <= start`; `InvalidSpan` if `max_span` is not
    /// positive.
    pub fn split(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_span: Duration,
    ) -> Result<Self, PlanError> {
        if end <= start {
            return Err(PlanError::InvalidRange { start, end });
        }
        if max_span <= Duration::zero() {
            return Err(PlanError::InvalidSpan(format!(
                "must be positive, got {max_span}"
            )));
        }
        Ok(Self {
            cursor: start,
            end,
            max_span,
        })
    }

    /// Number of sub-windows not yet yielded.
    pub fn remaining(&self) -> usize {
        if self.cursor >= self.end {
            return 0;
        }
        let total = (self.end - self.cursor).num_milliseconds();
        let span = self.max_span.num_milliseconds();
        ((total + span - 1) / span) as usize
    }
}

impl Iterator for WindowPlan {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.end {
            return None;
        }
        let stop = (self.cursor + self.max_span).min(self.end);
        let window = TimeWindow::new(self.cursor, stop);
        self.cursor = stop;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for WindowPlan {}
