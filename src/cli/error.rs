//! CLI error types and conversions

use crate::catalog::CatalogError;
use crate::downloader::RunError;
use crate::planner::PlanError;
use crate::storage::StorageError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Catalog error (unknown country, bad catalog data)
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Window-planning error
    #[error("planning error: {0}")]
    Plan(#[from] PlanError),

    /// Run-planning error
    #[error("run error: {0}")]
    Run(#[from] RunError),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// The run finished in the failed state
    #[error("run failed: {0}")]
    RunFailed(String),
}
