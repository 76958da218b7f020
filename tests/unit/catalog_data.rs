//! Catalog data integrity checks over the embedded table

use entsoe_flows::catalog::ZoneCatalog;
use entsoe_flows::Zone;

#[test]
fn test_embedded_catalog_is_closed_and_symmetric() {
    let catalog = ZoneCatalog::load_embedded().unwrap();

    for country in catalog.countries() {
        let entry = catalog.entry(&country).unwrap();
        assert!(!entry.zones().is_empty(), "{country} has no zones");

        for neighbor in entry.neighbors() {
            let other = catalog
                .entry(neighbor)
                .unwrap_or_else(|| panic!("{country} references unconfigured {neighbor}"));
            assert!(
                other.neighbors().contains(&country),
                "{neighbor} does not list {country} back"
            );
        }
    }
}

#[test]
fn test_zone_ownership_is_unique() {
    let catalog = ZoneCatalog::load_embedded().unwrap();
    let mut seen = std::collections::HashSet::new();
    for country in catalog.countries() {
        for zone in catalog.zones_of(&country).unwrap() {
            assert!(seen.insert(zone.clone()), "zone {zone} appears twice");
            assert_eq!(catalog.country_of(zone), Some(&country));
        }
    }
}

#[test]
fn test_neighbor_zones_are_always_foreign() {
    let catalog = ZoneCatalog::load_embedded().unwrap();
    for country in catalog.countries() {
        for zone in catalog.zones_of(&country).unwrap() {
            for neighbor_zone in catalog.neighbors_of(zone) {
                assert_ne!(
                    catalog.country_of(&neighbor_zone),
                    Some(&country),
                    "{zone} lists same-country zone {neighbor_zone} as neighbor"
                );
            }
        }
    }
}

#[test]
fn test_known_eic_codes_resolve() {
    let catalog = ZoneCatalog::load_embedded().unwrap();
    let bg = Zone::from("10YCA-BULGARIA-R");
    assert_eq!(catalog.country_of(&bg).map(|c| c.as_str()), Some("BG"));
    let se4 = Zone::from("10Y1001A1001A47J");
    assert_eq!(catalog.country_of(&se4).map(|c| c.as_str()), Some("SE"));
}
