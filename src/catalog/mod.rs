//! Zone catalog: country → bidding-zone EIC codes and border neighbors
//!
//! The catalog is static configuration data. It ships embedded in the binary
//! and is loaded once before planning begins, then passed around as an
//! immutable value — consumers never reach for a process global, so tests can
//! inject small fixture catalogs via [`ZoneCatalog::from_json`].

use crate::{CountryCode, Zone};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Embedded catalog data
const CATALOG_JSON: &str = include_str!("catalog.json");

/// Errors raised by catalog loading and lookups
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to parse catalog JSON
    #[error("catalog parse error: {0}")]
    ParseError(String),

    /// Catalog data is internally inconsistent
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Requested country is not configured
    #[error("unknown country: {0}")]
    UnknownCountry(String),
}

/// A configured country: its zones and its border neighbors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryEntry {
    iso: CountryCode,
    name: String,
    zones: Vec<Zone>,
    neighbors: Vec<CountryCode>,
}

impl CountryEntry {
    /// ISO code
    pub fn iso(&self) -> &CountryCode {
        &self.iso
    }

    /// Human-readable country name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bidding-zone EIC codes, in catalog order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Border neighbor countries, in catalog order
    pub fn neighbors(&self) -> &[CountryCode] {
        &self.neighbors
    }
}

/// Raw catalog structure for deserialization
#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[allow(dead_code)]
    schema_version: String,
    #[allow(dead_code)]
    last_updated: String,
    countries: Vec<CountryEntry>,
}

/// Immutable mapping from countries to zones and neighbors.
///
/// Invariants, enforced at load time:
/// - every country has at least one zone
/// - every zone belongs to exactly one country
/// - every neighbor reference resolves to a configured country
/// - adjacency is symmetric and never self-referential
#[derive(Debug, Clone)]
pub struct ZoneCatalog {
    countries: BTreeMap<CountryCode, CountryEntry>,
    zone_owner: HashMap<Zone, CountryCode>,
}

impl ZoneCatalog {
    /// Load the catalog embedded in the binary.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        Self::from_json(CATALOG_JSON)
    }

    /// Parse a catalog from a JSON string and validate its invariants.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)
            .map_err(|e| CatalogError::ParseError(format!("Failed to parse catalog: {e}")))?;

        let mut countries = BTreeMap::new();
        let mut zone_owner: HashMap<Zone, CountryCode> = HashMap::new();

        for entry in raw.countries {
            if entry.zones.is_empty() {
                return Err(CatalogError::InvalidCatalog(format!(
                    "country {} has no zones",
                    entry.iso
                )));
            }
            for zone in &entry.zones {
                if let Some(previous) = zone_owner.insert(zone.clone(), entry.iso.clone()) {
                    return Err(CatalogError::InvalidCatalog(format!(
                        "zone {zone} is claimed by both {previous} and {}",
                        entry.iso
                    )));
                }
            }
            if countries.insert(entry.iso.clone(), entry).is_some() {
                return Err(CatalogError::InvalidCatalog(
                    "duplicate country entry".to_string(),
                ));
            }
        }

        let catalog = Self {
            countries,
            zone_owner,
        };
        catalog.check_adjacency()?;
        Ok(catalog)
    }

    fn check_adjacency(&self) -> Result<(), CatalogError> {
        for (iso, entry) in &self.countries {
            for neighbor in &entry.neighbors {
                if neighbor == iso {
                    return Err(CatalogError::InvalidCatalog(format!(
                        "country {iso} lists itself as a neighbor"
                    )));
                }
                let Some(other) = self.countries.get(neighbor) else {
                    return Err(CatalogError::InvalidCatalog(format!(
                        "country {iso} references unconfigured neighbor {neighbor}"
                    )));
                };
                if !other.neighbors.contains(iso) {
                    return Err(CatalogError::InvalidCatalog(format!(
                        "adjacency is not symmetric: {iso} lists {neighbor}, but not vice versa"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Zones of a country.
    ///
    /// # Errors
    ///
    /// `UnknownCountry` if the code is not configured.
    pub fn zones_of(&self, country: &CountryCode) -> Result<&[Zone], CatalogError> {
        self.countries
            .get(country)
            .map(|e| e.zones.as_slice())
            .ok_or_else(|| CatalogError::UnknownCountry(country.to_string()))
    }

    /// All zones sharing a physical border with `zone`: the zones of every
    /// neighbor country of the zone's owner.
    ///
    /// Returns an empty set (not an error) for an unknown zone or a country
    /// with no configured neighbors.
    pub fn neighbors_of(&self, zone: &Zone) -> Vec<Zone> {
        let Some(owner) = self.zone_owner.get(zone) else {
            return Vec::new();
        };
        let entry = &self.countries[owner];
        entry
            .neighbors
            .iter()
            .flat_map(|n| self.countries[n].zones.iter().cloned())
            .collect()
    }

    /// The country a zone belongs to, if configured.
    pub fn country_of(&self, zone: &Zone) -> Option<&CountryCode> {
        self.zone_owner.get(zone)
    }

    /// All configured countries, sorted by ISO code.
    ///
    /// Drives the `all` sentinel: "fetch all configured countries" resolves
    /// to this list during planning.
    pub fn countries(&self) -> Vec<CountryCode> {
        self.countries.keys().cloned().collect()
    }

    /// Entry for a country, if configured.
    pub fn entry(&self, country: &CountryCode) -> Option<&CountryEntry> {
        self.countries.get(country)
    }

    /// Iterate all entries, sorted by ISO code.
    pub fn entries(&self) -> impl Iterator<Item = &CountryEntry> {
        self.countries.values()
    }
}
