//! Integration tests for the ingest engine.
//!
//! The store seam is in-process (`InMemoryStore`), so no external backend
//! is needed; every test drives the full facade surface.
//!
//! # Test Organization
//! - `happy_*` - Normal operation: lifecycle, batching, dedup, expiry
//! - `burst_*` - Threshold-crossing arrival patterns

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use ingest_engine::{IngestConfig, IngestEngine, InMemoryStore, Record};

fn measurement(path: &str, value: f64) -> Record {
    Record::new(json!({"path": path, "value": value}))
}

fn engine_with(config: IngestConfig) -> (Arc<InMemoryStore>, IngestEngine) {
    let store = Arc::new(InMemoryStore::new());
    let engine = IngestEngine::new(config, store.clone());
    (store, engine)
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn happy_end_to_end_size_triggered_flush() {
    // batch_size=2, max_capacity=5, periodic flush disabled:
    // sending A, B, C must auto-flush {A, B}, leave {C} buffered, and
    // stop() must flush {C}.
    let (store, mut engine) = engine_with(IngestConfig {
        batch_size: 2,
        max_capacity: 5,
        flush_interval_ms: 0,
        ..Default::default()
    });
    engine.start().await.expect("start failed");

    engine.send(measurement("nav.speed", 12.3)).await.unwrap();
    assert_eq!(engine.buffered(), 1);
    assert!(store.is_empty("measurements"));

    engine.send(measurement("nav.heading", 271.0)).await.unwrap();
    // Size threshold hit after B: {A, B} flushed synchronously
    assert_eq!(engine.buffered(), 0);
    assert_eq!(store.batch_sizes(), vec![2]);

    engine.send(measurement("nav.depth", 42.0)).await.unwrap();
    assert_eq!(engine.buffered(), 1);

    engine.stop().await;

    assert_eq!(store.batch_sizes(), vec![2, 1]);
    assert_eq!(store.len("measurements"), 3);
    assert_eq!(engine.buffered(), 0);
}

#[tokio::test]
async fn happy_dedup_collapses_identical_payloads() {
    let (store, mut engine) = engine_with(IngestConfig {
        batch_size: 100,
        flush_interval_ms: 0,
        ..Default::default()
    });
    engine.start().await.unwrap();

    for _ in 0..10 {
        engine.send(measurement("env.temp", 21.5)).await.unwrap();
    }
    engine.send(measurement("env.temp", 21.6)).await.unwrap();

    assert_eq!(engine.buffered(), 2);

    engine.stop().await;
    assert_eq!(store.len("measurements"), 2);
}

#[tokio::test]
async fn happy_records_carry_engine_fields() {
    let (store, mut engine) = engine_with(IngestConfig {
        batch_size: 1,
        ..Default::default()
    });
    engine.start().await.unwrap();

    let fp = engine.send(measurement("env.pressure", 1013.2)).await.unwrap();
    engine.stop().await;

    let docs = store.documents("measurements");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].fingerprint, fp);
    assert!(docs[0].observed_at > 0);
    assert!(docs[0].expires_at > docs[0].observed_at);
}

#[tokio::test]
async fn happy_custom_collection_is_used() {
    let (store, mut engine) = engine_with(IngestConfig {
        collection: "vessel_metrics".into(),
        batch_size: 1,
        ..Default::default()
    });
    engine.start().await.unwrap();

    engine.send(measurement("nav.sog", 8.4)).await.unwrap();
    engine.stop().await;

    assert_eq!(store.len("vessel_metrics"), 1);
    assert!(store.is_empty("measurements"));
}

#[tokio::test]
async fn happy_periodic_tick_flushes_without_sends() {
    let (store, mut engine) = engine_with(IngestConfig {
        batch_size: 100,
        flush_interval_ms: 20,
        housekeeping_interval_ms: 10,
        ..Default::default()
    });
    engine.start().await.unwrap();

    engine.send(measurement("nav.cog", 180.0)).await.unwrap();
    assert!(store.is_empty("measurements"));

    // Wait for the deadline to pass and a housekeeping tick to fire
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(store.len("measurements"), 1);
    assert_eq!(engine.buffered(), 0);

    engine.stop().await;
}

#[tokio::test]
async fn happy_ttl_expiry_drops_instead_of_flushing() {
    let (store, mut engine) = engine_with(IngestConfig {
        batch_size: 100,
        ttl_ms: 20,
        flush_interval_ms: 0,
        housekeeping_interval_ms: 10,
        ..Default::default()
    });
    engine.start().await.unwrap();

    engine.send(measurement("env.humidity", 63.0)).await.unwrap();
    assert_eq!(engine.buffered(), 1);

    tokio::time::sleep(Duration::from_millis(100)).await;

    // Swept by housekeeping, never written
    assert_eq!(engine.buffered(), 0);
    assert!(store.is_empty("measurements"));

    engine.stop().await;
    assert!(store.is_empty("measurements"));
}

// =============================================================================
// Bursts & capacity
// =============================================================================

#[tokio::test]
async fn burst_capacity_overflow_rejects_excess() {
    let (_store, mut engine) = engine_with(IngestConfig {
        batch_size: 100, // above capacity: no size-triggered flush
        max_capacity: 5,
        flush_interval_ms: 0,
        ..Default::default()
    });
    engine.start().await.unwrap();

    let mut rejected = 0;
    for i in 0..6 {
        if engine.send(measurement("burst.value", f64::from(i))).await.is_err() {
            rejected += 1;
        }
    }

    assert_eq!(rejected, 1);
    assert_eq!(engine.buffered(), 5);

    engine.stop().await;
}

#[tokio::test]
async fn burst_many_distinct_records_flush_in_full_batches() {
    let (store, mut engine) = engine_with(IngestConfig {
        batch_size: 10,
        max_capacity: 1000,
        flush_interval_ms: 0,
        ..Default::default()
    });
    engine.start().await.unwrap();

    for i in 0..95 {
        engine.send(measurement("burst.seq", f64::from(i))).await.unwrap();
    }
    engine.stop().await;

    assert_eq!(store.len("measurements"), 95);
    // Every size-triggered batch is exactly batch_size; the stop() flush
    // carries the remainder.
    let sizes = store.batch_sizes();
    assert_eq!(sizes.iter().sum::<usize>(), 95);
    assert!(sizes[..sizes.len() - 1].iter().all(|&s| s == 10));
    assert_eq!(*sizes.last().unwrap(), 5);
}
