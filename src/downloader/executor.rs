//! Run executor: plan, dry-run, execute
//!
//! Execution iterates the Cartesian product of directed pairs and
//! sub-windows, dispatching each unit to a bounded worker pool. Units are
//! independent: each one fetches, then upserts a batch with keys disjoint
//! from every other unit's, so outcome tracking is the only aggregation.
//!
//! Failure policy (defaults): a permanent provider rejection or a storage
//! fault is fatal — no further units are dispatched and the run reports
//! `Failed`. A transient failure that survived its retries is logged with
//! full pair/window context, counted as skipped, and the run continues.

use crate::catalog::ZoneCatalog;
use crate::downloader::RunError;
use crate::fetcher::{FetchError, FlowFetcher};
use crate::planner::{expand_directed_pairs, WindowPlan};
use crate::shutdown::SharedShutdown;
use crate::storage::FlowStore;
use crate::{metrics, CountryCode, DirectedPair, TimeWindow};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// One unit of work: a directed pair over one sub-window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    /// Pair to query
    pub pair: DirectedPair,
    /// Sub-window to query
    pub window: TimeWindow,
}

/// The validated plan for a run: pairs × windows.
#[derive(Debug, Clone, Serialize)]
pub struct RunPlan {
    /// Directed pairs, in stable expansion order
    pub pairs: Vec<DirectedPair>,
    /// Chronological sub-windows
    pub windows: Vec<TimeWindow>,
}

impl RunPlan {
    /// Total number of work units.
    pub fn unit_count(&self) -> usize {
        self.pairs.len() * self.windows.len()
    }

    /// Iterate the pair × window product, pair-major.
    pub fn units(&self) -> impl Iterator<Item = WorkUnit> + '_ {
        self.pairs.iter().flat_map(move |pair| {
            self.windows.iter().map(move |window| WorkUnit {
                pair: pair.clone(),
                window: *window,
            })
        })
    }
}

/// Build the plan for a run.
///
/// This is the whole of the `Planning` phase: bad countries or an invalid
/// range abort here, before any network or storage access. A dry run stops
/// after this step and reports the plan.
pub fn plan_run(
    catalog: &ZoneCatalog,
    countries: &[CountryCode],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    max_span: chrono::Duration,
) -> Result<RunPlan, RunError> {
    let pairs = expand_directed_pairs(catalog, countries)?;
    let windows: Vec<TimeWindow> = WindowPlan::split(start, end, max_span)?.collect();
    Ok(RunPlan { pairs, windows })
}

/// Terminal status of an executed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Every unit succeeded, or failures were tolerated (skipped) ones
    Completed,
    /// At least one unit raised a non-tolerated error
    Failed,
}

/// Aggregated result of an executed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Terminal status
    pub status: RunStatus,
    /// Units in the plan
    pub total_units: usize,
    /// Units that fetched and persisted successfully
    pub succeeded: usize,
    /// Units skipped: transient failures after retries, plus units never
    /// dispatched because the run was cancelled or aborted
    pub skipped: usize,
    /// Total rows written across all units
    pub records_written: u64,
    /// Whether cancellation was requested while the run was in flight
    pub cancelled: bool,
    /// Cause of the first fatal failure, when `status` is `Failed`
    pub fatal_error: Option<String>,
}

enum UnitOutcome {
    Succeeded(u64),
    Skipped,
    NotDispatched,
    Fatal(String),
}

/// Executes a [`RunPlan`] against a fetcher and a store.
pub struct FlowRunExecutor {
    fetcher: Arc<dyn FlowFetcher>,
    store: Arc<dyn FlowStore>,
    concurrency: usize,
    shutdown: Option<SharedShutdown>,
    progress: Option<ProgressBar>,
}

impl FlowRunExecutor {
    /// Create an executor with the default worker count.
    pub fn new(fetcher: Arc<dyn FlowFetcher>, store: Arc<dyn FlowStore>) -> Self {
        Self {
            fetcher,
            store,
            concurrency: 4,
            shutdown: crate::shutdown::ShutdownCoordinator::global(),
            progress: None,
        }
    }

    /// Set the worker-pool size.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Attach a shared shutdown handle for graceful cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Attach a progress bar advanced once per finished unit.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_triggered())
            .unwrap_or(false)
    }

    /// Execute every unit of the plan and aggregate the outcome.
    pub async fn execute(&self, plan: &RunPlan) -> RunOutcome {
        let total_units = plan.unit_count();
        let span = tracing::info_span!(
            "execute_run",
            pairs = plan.pairs.len(),
            windows = plan.windows.len(),
            units = total_units
        );
        let _enter = span.enter();

        info!(concurrency = self.concurrency, "Starting flow run");

        let abort = Arc::new(AtomicBool::new(false));

        let results: Vec<UnitOutcome> = stream::iter(plan.units())
            .map(|unit| {
                let fetcher = Arc::clone(&self.fetcher);
                let store = Arc::clone(&self.store);
                let abort = Arc::clone(&abort);
                let shutdown = self.shutdown.clone();
                let progress = self.progress.clone();

                async move {
                    let outcome = run_unit(&*fetcher, &*store, &unit, &abort, shutdown.as_deref())
                        .await;
                    if let Some(progress) = progress {
                        progress.inc(1);
                    }
                    outcome
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut succeeded = 0usize;
        let mut skipped = 0usize;
        let mut records_written = 0u64;
        let mut fatal_error = None;
        for result in results {
            match result {
                UnitOutcome::Succeeded(written) => {
                    succeeded += 1;
                    records_written += written;
                }
                UnitOutcome::Skipped | UnitOutcome::NotDispatched => skipped += 1,
                UnitOutcome::Fatal(cause) => {
                    if fatal_error.is_none() {
                        fatal_error = Some(cause);
                    }
                }
            }
        }

        let cancelled = self.shutdown_requested();
        let status = if fatal_error.is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };

        info!(
            ?status,
            total_units,
            succeeded,
            skipped,
            records_written,
            cancelled,
            "Flow run finished"
        );

        RunOutcome {
            status,
            total_units,
            succeeded,
            skipped,
            records_written,
            cancelled,
            fatal_error,
        }
    }
}

async fn run_unit(
    fetcher: &dyn FlowFetcher,
    store: &dyn FlowStore,
    unit: &WorkUnit,
    abort: &AtomicBool,
    shutdown: Option<&crate::shutdown::ShutdownCoordinator>,
) -> UnitOutcome {
    // A fatal failure or a cancellation stops dispatch; in-flight units are
    // unaffected and finish normally.
    if abort.load(Ordering::SeqCst) || shutdown.map(|s| s.is_triggered()).unwrap_or(false) {
        debug!(pair = %unit.pair, window = %unit.window, "Unit not dispatched");
        return UnitOutcome::NotDispatched;
    }

    let span = tracing::info_span!("work_unit", pair = %unit.pair, window = %unit.window);
    let _enter = span.enter();

    match fetcher.fetch(&unit.pair, &unit.window).await {
        Ok(records) => {
            if records.is_empty() {
                debug!("No flow reported for window");
                metrics::record_unit_success(0);
                return UnitOutcome::Succeeded(0);
            }
            match store.upsert_batch(&records).await {
                Ok(written) => {
                    debug!(records = records.len(), written, "Unit persisted");
                    metrics::record_unit_success(written);
                    UnitOutcome::Succeeded(written)
                }
                Err(e) => {
                    error!(error = %e, "Storage failure; aborting run");
                    metrics::record_unit_fatal();
                    abort.store(true, Ordering::SeqCst);
                    UnitOutcome::Fatal(e.to_string())
                }
            }
        }
        Err(e @ FetchError::Failed { .. }) => {
            warn!(error = %e, "Unit skipped after retry exhaustion");
            metrics::record_unit_skipped();
            UnitOutcome::Skipped
        }
        Err(e @ FetchError::Rejected { .. }) => {
            error!(error = %e, "Provider rejected request; aborting run");
            metrics::record_unit_fatal();
            abort.store(true, Ordering::SeqCst);
            UnitOutcome::Fatal(e.to_string())
        }
    }
}
