//! Metrics instrumentation for run outcomes
//!
//! Emits counters through the `metrics` facade. Installing a recorder (and
//! any export surface) is the embedding application's concern; without one
//! these calls are no-ops.

use metrics::counter;

/// Record a work unit whose records were fetched and persisted.
pub fn record_unit_success(records_written: u64) {
    counter!("flow_units_succeeded_total").increment(1);
    counter!("flow_records_written_total").increment(records_written);
}

/// Record a work unit skipped after retry exhaustion.
pub fn record_unit_skipped() {
    counter!("flow_units_skipped_total").increment(1);
}

/// Record a work unit that failed fatally (provider rejection or storage fault).
pub fn record_unit_fatal() {
    counter!("flow_units_fatal_total").increment(1);
}

/// Record one retry attempt of a provider request.
pub fn record_retry() {
    counter!("flow_request_retries_total").increment(1);
}
