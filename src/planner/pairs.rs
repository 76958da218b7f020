//! Directed neighbor-pair expansion
//!
//! Requested countries are expanded to their zones, each zone is paired with
//! every zone across its configured borders, and both flow directions are
//! emitted. The provider measures flow per direction, so `(a, b)` and
//! `(b, a)` are distinct requests — and both are needed even when the
//! neighbor country itself was not requested.

use crate::catalog::{CatalogError, ZoneCatalog};
use crate::{CountryCode, DirectedPair};
use std::collections::HashSet;

/// Expand requested countries into the deduplicated set of directed pairs.
///
/// Duplicate input countries are ignored after the first occurrence. Output
/// order is first-emission order, so repeated invocations over the same
/// input produce identical, stable listings.
///
/// # Errors
///
/// `UnknownCountry` if any input code is not configured. The whole request
/// fails before any pair is produced — a partially expanded neighbor graph
/// would look like a successful run while silently missing borders.
pub fn expand_directed_pairs(
    catalog: &ZoneCatalog,
    countries: &[CountryCode],
) -> Result<Vec<DirectedPair>, CatalogError> {
    // Validate every input up front; expansion only starts once the whole
    // request is known-good.
    let mut requested = Vec::new();
    let mut seen_countries = HashSet::new();
    for country in countries {
        catalog.zones_of(country)?;
        if seen_countries.insert(country.clone()) {
            requested.push(country.clone());
        }
    }

    let mut pairs = Vec::new();
    let mut seen = HashSet::new();
    for country in &requested {
        for zone in catalog.zones_of(country)? {
            for neighbor in catalog.neighbors_of(zone) {
                let outbound = DirectedPair::new(zone.clone(), neighbor.clone());
                let inbound = outbound.reversed();
                for pair in [outbound, inbound] {
                    if seen.insert(pair.clone()) {
                        pairs.push(pair);
                    }
                }
            }
        }
    }

    Ok(pairs)
}
