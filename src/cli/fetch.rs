//! Fetch command implementation

use crate::catalog::ZoneCatalog;
use crate::downloader::config::{DEFAULT_MAX_WINDOW_DAYS, DEFAULT_PACE_MS};
use crate::downloader::{plan_run, FlowRunExecutor, RateLimiter, RunOutcome, RunPlan, RunStatus};
use crate::fetcher::EntsoeFlowFetcher;
use crate::shutdown::SharedShutdown;
use crate::storage::SqliteFlowStore;
use crate::{CountryCode, TimeWindow};
use chrono::{DateTime, Duration, DurationRound, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use super::CliError;

/// Maximum allowed concurrency to prevent self-inflicted rate limiting
const MAX_CONCURRENCY: usize = 32;

/// Sentinel meaning "every configured country"
const ALL_COUNTRIES: &str = "all";

/// Try to parse a datetime from RFC-3339 format.
///
/// Handles inputs with and without timezone designators:
/// - "2025-11-20T00:00:00Z" - explicit UTC
/// - "2025-11-20T00:00:00+01:00" - explicit offset
/// - "2025-11-20T00:00:00" - no timezone, assumed UTC
fn try_parse_datetime_rfc3339(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&format!("{input}Z")) {
        return Some(dt.with_timezone(&Utc));
    }

    None
}

/// Floor a timestamp to the provider's 15-minute market time unit.
fn floor_to_step(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.duration_trunc(Duration::minutes(15)).unwrap_or(dt)
}

/// Parse a start bound from `YYYY-MM-DD` or RFC-3339 datetime format.
///
/// Date-only input means start-of-day (00:00 UTC).
fn parse_start_flexible(input: &str) -> Result<DateTime<Utc>, CliError> {
    if let Some(dt) = try_parse_datetime_rfc3339(input) {
        return Ok(dt);
    }

    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| CliError::InvalidArgument(format!("Invalid start time: {e}")))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CliError::InvalidArgument("Invalid start time".to_string()))?;
    Ok(Utc.from_utc_datetime(&datetime))
}

/// Parse an end bound from `YYYY-MM-DD` or RFC-3339 datetime format.
///
/// Date-only input means the following midnight, so the named date is fully
/// covered by the half-open window.
fn parse_end_flexible(input: &str) -> Result<DateTime<Utc>, CliError> {
    if let Some(dt) = try_parse_datetime_rfc3339(input) {
        return Ok(dt);
    }

    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| CliError::InvalidArgument(format!("Invalid end time: {e}")))?;
    let next_midnight = date
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| CliError::InvalidArgument("Invalid end time".to_string()))?;
    Ok(Utc.from_utc_datetime(&next_midnight))
}

/// Parse and validate a concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Output format options
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// ENTSO-E cross-border flow downloader CLI
#[derive(Parser, Debug)]
#[command(name = "entsoe-flows")]
#[command(about = "Download ENTSO-E cross-border physical flows for neighboring zones", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Number of concurrent work units (default: 4, max: 32)
    ///
    /// The shared rate limiter coordinates all concurrent requests to stay
    /// within the provider's per-token limit, so raising this mainly helps
    /// when windows are short and pairs are many.
    #[arg(long, global = true, default_value = "4", value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Maximum number of retries for transient request failures (range: 1-20)
    #[arg(long, global = true, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,

    /// Minimum delay between provider requests, in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_PACE_MS)]
    pub pace_ms: u64,

    /// Maximum span of a single provider request, in days (range: 1-366)
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_WINDOW_DAYS, value_parser = clap::value_parser!(i64).range(1..=366))]
    pub max_window_days: i64,

    /// SQLite database path
    #[arg(long, global = true, default_value = "flows.sqlite")]
    pub db: PathBuf,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch cross-border flows for the given countries
    Fetch(FetchArgs),

    /// List configured countries, zones, and neighbors
    Zones(super::ZonesCommand),
}

/// Fetch command arguments
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Comma-separated ISO country codes (e.g. BG,RO), or "all" for every
    /// configured country. Each country is paired with its configured border
    /// neighbors only, in both directions.
    #[arg(long)]
    pub countries: String,

    /// UTC start (YYYY-MM-DD or RFC-3339, e.g. 2025-11-20T00:00:00Z)
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// UTC end, exclusive (YYYY-MM-DD or RFC-3339)
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Lookback window in hours, used when --start/--end are not given
    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u32).range(1..=8760))]
    pub hours: u32,

    /// Show the expanded pair/window plan; do not contact the provider or
    /// touch storage
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Optional path to dump the fetched window as JSON (debug/export)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// ENTSO-E security token (falls back to the ENTSOE_TOKEN environment
    /// variable)
    #[arg(long)]
    pub token: Option<String>,
}

impl FetchArgs {
    /// Resolve the requested countries against the catalog's configured set.
    fn parse_countries(&self, catalog: &ZoneCatalog) -> Result<Vec<CountryCode>, CliError> {
        if self.countries.trim().eq_ignore_ascii_case(ALL_COUNTRIES) {
            return Ok(catalog.countries());
        }
        self.countries
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.parse::<CountryCode>()
                    .map_err(|e| CliError::InvalidArgument(e.to_string()))
            })
            .collect()
    }

    /// Determine the requested `[start, end)` range.
    ///
    /// With explicit bounds, both are floored to the provider's 15-minute
    /// step. Otherwise the lookback ends at the next full hour.
    fn determine_window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), CliError> {
        if let (Some(start), Some(end)) = (&self.start, &self.end) {
            let start = floor_to_step(parse_start_flexible(start)?);
            let end = floor_to_step(parse_end_flexible(end)?);
            return Ok((start, end));
        }

        let now = Utc::now();
        let end = now
            .duration_trunc(Duration::hours(1))
            .unwrap_or(now)
            + Duration::hours(1);
        let start = end - Duration::hours(i64::from(self.hours));
        Ok((start, end))
    }

    /// Execute the fetch command.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let catalog = ZoneCatalog::load_embedded()?;
        let countries = self.parse_countries(&catalog)?;
        let (start, end) = self.determine_window()?;

        // Planning: fails fast on unknown countries or an invalid range,
        // before any network or storage access.
        let plan = plan_run(
            &catalog,
            &countries,
            start,
            end,
            Duration::days(cli.max_window_days),
        )?;

        if self.dry_run {
            report_plan(&catalog, &plan, cli.output_format);
            return Ok(());
        }

        let token = self
            .token
            .clone()
            .or_else(|| std::env::var("ENTSOE_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                CliError::ConfigurationError(
                    "missing security token: pass --token or set ENTSOE_TOKEN".to_string(),
                )
            })?;

        let store = SqliteFlowStore::open(&cli.db.to_string_lossy()).await?;
        let limiter = RateLimiter::shared(std::time::Duration::from_millis(cli.pace_ms));
        let fetcher = EntsoeFlowFetcher::new(token, limiter, cli.max_retries)
            .with_shutdown(shutdown.clone());

        let progress = create_progress_bar(&plan);
        let executor = FlowRunExecutor::new(Arc::new(fetcher), Arc::new(store.clone()))
            .with_concurrency(cli.concurrency)
            .with_shutdown(shutdown)
            .with_progress(progress.clone());

        info!(
            pairs = plan.pairs.len(),
            windows = plan.windows.len(),
            units = plan.unit_count(),
            "Fetching cross-border flows"
        );

        let outcome = executor.execute(&plan).await;
        progress.finish_and_clear();

        if let Some(path) = &self.output {
            dump_window_json(&store, start, end, path).await?;
        }

        match cli.output_format {
            OutputFormat::Json => output_json(&plan, &outcome),
            OutputFormat::Human => output_human(&plan, &outcome),
        }

        match outcome.status {
            RunStatus::Completed => Ok(()),
            RunStatus::Failed => Err(CliError::RunFailed(
                outcome
                    .fatal_error
                    .unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

/// Print the dry-run report: the planned pairs and windows, nothing else.
fn report_plan(catalog: &ZoneCatalog, plan: &RunPlan, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "pairs": plan.pairs,
                "windows": plan.windows,
                "unit_count": plan.unit_count(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output).unwrap_or_default()
            );
        }
        OutputFormat::Human => {
            let mut involved: Vec<String> = plan
                .pairs
                .iter()
                .flat_map(|p| [&p.out_zone, &p.in_zone])
                .filter_map(|z| catalog.country_of(z))
                .map(|c| c.to_string())
                .collect();
            involved.sort();
            involved.dedup();

            println!(
                "Planned {} directed pairs x {} windows = {} work units",
                plan.pairs.len(),
                plan.windows.len(),
                plan.unit_count()
            );
            println!("Involved countries: {}", involved.join(", "));
            for window in &plan.windows {
                println!("Window: {window}");
            }
            let show = plan.pairs.len().min(10);
            let sample: Vec<String> = plan.pairs[..show].iter().map(|p| p.to_string()).collect();
            println!("Sample pairs ({show}): {}", sample.join(", "));
        }
    }
}

/// Dump every stored record inside `[start, end)` to a JSON file.
async fn dump_window_json(
    store: &SqliteFlowStore,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    path: &std::path::Path,
) -> Result<(), CliError> {
    let records = store
        .records_in_window(&TimeWindow::new(start, end))
        .await?;
    let payload = serde_json::to_string_pretty(&records)
        .map_err(|e| CliError::InvalidArgument(format!("Failed to serialize records: {e}")))?;
    std::fs::write(path, payload)
        .map_err(|e| CliError::InvalidArgument(format!("Failed to write {}: {e}", path.display())))?;
    info!(path = %path.display(), records = records.len(), "Wrote JSON dump");
    Ok(())
}

/// Output the run summary as JSON
fn output_json(plan: &RunPlan, outcome: &RunOutcome) {
    let output = serde_json::json!({
        "success": outcome.status == RunStatus::Completed,
        "pairs": plan.pairs.len(),
        "windows": plan.windows.len(),
        "total_units": outcome.total_units,
        "succeeded": outcome.succeeded,
        "skipped": outcome.skipped,
        "records_written": outcome.records_written,
        "cancelled": outcome.cancelled,
        "error": outcome.fatal_error,
    });
    println!("{}", serde_json::to_string(&output).unwrap_or_default());
}

/// Output the run summary in human-readable form
fn output_human(plan: &RunPlan, outcome: &RunOutcome) {
    match outcome.status {
        RunStatus::Completed => {
            if outcome.cancelled {
                println!("\nRun cancelled; partial results were kept.");
            } else {
                println!("\nRun completed successfully!");
            }
        }
        RunStatus::Failed => {
            eprintln!("\nRun failed!");
            if let Some(error) = &outcome.fatal_error {
                eprintln!("Error: {error}");
            }
        }
    }
    println!(
        "Pairs: {}  Windows: {}  Units: {}",
        plan.pairs.len(),
        plan.windows.len(),
        outcome.total_units
    );
    println!(
        "Succeeded: {}  Skipped: {}  Records written: {}",
        outcome.succeeded, outcome.skipped, outcome.records_written
    );
}

/// Create a progress bar spanning all work units
fn create_progress_bar(plan: &RunPlan) -> ProgressBar {
    let pb = ProgressBar::new(plan.unit_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message("Fetching flows");
    pb
}
