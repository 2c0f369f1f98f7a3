// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the ingest engine.
//!
//! Uses the `metrics` crate for backend-agnostic collection; the host
//! process chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `ingest_engine_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record a successfully staged record
pub fn record_staged() {
    counter!("ingest_engine_records_staged_total").increment(1);
}

/// Record a dropped record with the reason it was lost
pub fn record_dropped(reason: &str) {
    counter!(
        "ingest_engine_records_dropped_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record a completed flush
pub fn record_flush(batches: usize, records: usize, duration: Duration) {
    counter!("ingest_engine_flushes_total").increment(1);
    counter!("ingest_engine_records_flushed_total").increment(records as u64);
    histogram!("ingest_engine_flush_batches").record(batches as f64);
    histogram!("ingest_engine_flush_seconds").record(duration.as_secs_f64());
}

/// Record a failed batch write
pub fn record_flush_error() {
    counter!("ingest_engine_flush_errors_total").increment(1);
}

/// Record records removed by an expiry sweep
pub fn record_swept(count: usize) {
    counter!("ingest_engine_records_expired_total").increment(count as u64);
}

/// Record an exhausted connection retry sequence
pub fn record_connect_exhausted() {
    counter!("ingest_engine_connect_exhausted_total").increment(1);
}

/// Set current buffer occupancy
pub fn set_buffer_len(len: usize) {
    gauge!("ingest_engine_buffer_records").set(len as f64);
}

/// Set store connectivity gauge
pub fn set_store_connected(connected: bool) {
    gauge!("ingest_engine_store_connected").set(if connected { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    // The metrics facade is a no-op without an installed recorder; these
    // just pin the API so a rename shows up in review.
    #[test]
    fn test_helpers_are_callable() {
        record_staged();
        record_dropped("capacity");
        record_flush(2, 150, Duration::from_millis(5));
        record_flush_error();
        record_swept(3);
        record_connect_exhausted();
        set_buffer_len(10);
        set_store_connected(true);
    }
}
