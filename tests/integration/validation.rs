//! Pre-flight validation: bad input aborts before any side effects

use chrono::{Duration, TimeZone, Utc};
use entsoe_flows::catalog::{CatalogError, ZoneCatalog};
use entsoe_flows::downloader::{plan_run, RunError};
use entsoe_flows::planner::PlanError;
use entsoe_flows::CountryCode;

fn catalog() -> ZoneCatalog {
    ZoneCatalog::load_embedded().unwrap()
}

#[test]
fn test_unknown_country_aborts_planning() {
    let countries: Vec<CountryCode> = vec!["BG".parse().unwrap(), "XY".parse().unwrap()];
    let start = Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap();
    let end = start + Duration::hours(24);

    let result = plan_run(&catalog(), &countries, start, end, Duration::days(365));
    assert!(matches!(
        result,
        Err(RunError::Catalog(CatalogError::UnknownCountry(code))) if code == "XY"
    ));
}

#[test]
fn test_inverted_range_aborts_planning() {
    let countries: Vec<CountryCode> = vec!["BG".parse().unwrap()];
    let start = Utc.with_ymd_and_hms(2025, 11, 21, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap();

    let result = plan_run(&catalog(), &countries, start, end, Duration::days(365));
    assert!(matches!(
        result,
        Err(RunError::Plan(PlanError::InvalidRange { .. }))
    ));
}

#[test]
fn test_country_validation_runs_before_range_validation() {
    // Both inputs are bad; the country error must win, matching the
    // pre-flight order (pairs are expanded before windows are planned)
    let countries: Vec<CountryCode> = vec!["XY".parse().unwrap()];
    let start = Utc.with_ymd_and_hms(2025, 11, 21, 0, 0, 0).unwrap();
    let end = start - Duration::hours(1);

    let result = plan_run(&catalog(), &countries, start, end, Duration::days(365));
    assert!(matches!(result, Err(RunError::Catalog(_))));
}

#[test]
fn test_malformed_country_code_never_reaches_the_catalog() {
    assert!("bulgaria".parse::<CountryCode>().is_err());
    assert!("B".parse::<CountryCode>().is_err());
    assert!("".parse::<CountryCode>().is_err());
    // Well-formed but unconfigured codes are the catalog's concern
    assert!("XY".parse::<CountryCode>().is_ok());
}
