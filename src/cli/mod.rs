//! CLI command implementations

pub mod error;
pub mod fetch;
pub mod zones;

pub use error::CliError;
pub use fetch::{Cli, Commands, FetchArgs, OutputFormat};
pub use zones::ZonesCommand;
