//! Zones listing command

use crate::catalog::{CatalogError, ZoneCatalog};
use crate::CountryCode;
use clap::Parser;

use super::{CliError, OutputFormat};

/// List the configured countries, their zones, and their border neighbors
#[derive(Parser, Debug)]
pub struct ZonesCommand {
    /// Restrict the listing to one ISO country code
    #[arg(long)]
    pub country: Option<String>,
}

impl ZonesCommand {
    /// Execute the zones command.
    pub fn execute(&self, output_format: OutputFormat) -> Result<(), CliError> {
        let catalog = ZoneCatalog::load_embedded()?;

        let entries: Vec<_> = match &self.country {
            Some(code) => {
                let country: CountryCode = code
                    .parse()
                    .map_err(|e: crate::InvalidCountryCode| CliError::InvalidArgument(e.to_string()))?;
                let entry = catalog
                    .entry(&country)
                    .ok_or_else(|| CatalogError::UnknownCountry(country.to_string()))?;
                vec![entry.clone()]
            }
            None => catalog.entries().cloned().collect(),
        };

        match output_format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&entries).unwrap_or_default()
                );
            }
            OutputFormat::Human => {
                for entry in &entries {
                    let zones: Vec<String> =
                        entry.zones().iter().map(|z| z.to_string()).collect();
                    let neighbors: Vec<String> =
                        entry.neighbors().iter().map(|n| n.to_string()).collect();
                    println!(
                        "{}  {}\n  zones:     {}\n  neighbors: {}",
                        entry.iso(),
                        entry.name(),
                        zones.join(", "),
                        neighbors.join(", ")
                    );
                }
            }
        }

        Ok(())
    }
}
