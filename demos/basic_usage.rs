//! Basic usage walkthrough for the ingest engine.
//!
//! Runs the full lifecycle against the in-memory store client: start,
//! a burst of sends (with duplicates), size-triggered flushes, and stop.
//!
//! Run with: `cargo run --example basic_usage`

use std::sync::Arc;

use serde_json::json;

use ingest_engine::{IngestConfig, IngestEngine, InMemoryStore, Record};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Simple logging (no filter for simplicity)
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           ingest-engine: Basic Usage Example                  ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────
    // 1. Configure and start the engine
    // ─────────────────────────────────────────────────────────────────────
    let config = IngestConfig {
        collection: "vessel_metrics".into(),
        batch_size: 5,
        max_capacity: 8,
        flush_interval_ms: 0, // size-triggered flushes only for the demo
        ..Default::default()
    };

    let store = Arc::new(InMemoryStore::new());
    let mut engine = IngestEngine::new(config, store.clone());
    engine.start().await?;
    println!("→ engine started (batch_size=5, max_capacity=8)\n");

    // ─────────────────────────────────────────────────────────────────────
    // 2. Send a burst of measurements, including duplicates
    // ─────────────────────────────────────────────────────────────────────
    for rpm in [1450.0, 1450.0, 1500.0, 1525.0] {
        let fp = engine
            .send(Record::new(json!({
                "path": "propulsion.engine.rpm",
                "value": rpm,
            })))
            .await?;
        println!("→ staged rpm={rpm} (fingerprint {fp})");
    }
    println!(
        "\n  buffered: {} (the duplicate 1450.0 collapsed into one slot)\n",
        engine.buffered()
    );

    // ─────────────────────────────────────────────────────────────────────
    // 3. Cross the batch threshold: the flush happens inside send()
    // ─────────────────────────────────────────────────────────────────────
    for depth in [42.0, 43.5] {
        engine
            .send(Record::new(json!({"path": "nav.depth", "value": depth})))
            .await?;
    }
    println!(
        "→ after crossing batch_size: buffered={}, stored={}\n",
        engine.buffered(),
        store.len("vessel_metrics")
    );

    // ─────────────────────────────────────────────────────────────────────
    // 4. A sustained burst drains itself in size-triggered batches
    // ─────────────────────────────────────────────────────────────────────
    for i in 0..12 {
        engine
            .send(Record::new(json!({"path": "demo.burst", "value": i})))
            .await?;
    }
    println!(
        "→ burst of 12: buffered={}, stored={}",
        engine.buffered(),
        store.len("vessel_metrics")
    );

    // ─────────────────────────────────────────────────────────────────────
    // 5. Stop: final flush, then close
    // ─────────────────────────────────────────────────────────────────────
    engine.stop().await;
    println!(
        "\n→ stopped. store received {} documents in batches {:?}",
        store.len("vessel_metrics"),
        store.batch_sizes()
    );

    Ok(())
}
