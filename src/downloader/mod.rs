//! Run orchestration
//!
//! Drives the pipeline: pair expansion and window planning happen up front
//! (failing fast on bad input, before any network or storage access), then
//! the pair × window product is dispatched to a bounded worker pool. The
//! shared rate limiter is the pool's single serialization point.
//!
//! # Components
//!
//! - [`executor`] - Planning, dry-run reporting, and execution
//! - [`rate_limit`] - Shared request pacing
//! - [`config`] - Retry/backoff constants and defaults

pub mod config;
pub mod executor;
pub mod rate_limit;

pub use executor::{plan_run, FlowRunExecutor, RunOutcome, RunPlan, RunStatus, WorkUnit};
pub use rate_limit::RateLimiter;

use crate::catalog::CatalogError;
use crate::planner::PlanError;

/// Errors raised while planning a run, before any side effects
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A requested country is not configured
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The requested time range or window configuration is invalid
    #[error(transparent)]
    Plan(#[from] PlanError),
}
