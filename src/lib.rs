//! # Ingest Engine
//!
//! A bounded, deduplicating write-buffer / batching engine for timestamped
//! measurement records, flushing to a remote document store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      IngestEngine (facade)                  │
//! │  • Accepts Records via send()                               │
//! │  • start() connects + arms the housekeeping tick            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        IngestBuffer                         │
//! │  • Keyed by payload fingerprint (dedup, last-write-wins)    │
//! │  • Bounded: rejects on overflow, never evicts               │
//! │  • TTL residency: stale records swept, not flushed          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                 (size- or time-triggered batches)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       FlushScheduler                        │
//! │  • At most one flush in flight system-wide                  │
//! │  • ceil(size/batch) batches per cycle, oldest first         │
//! │  • Failed batches re-queued with a bounded retry budget     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                ConnectionGuard → StoreClient                │
//! │  • Connect with exponential-backoff retry                   │
//! │  • Lazy reconnect on the send path only                     │
//! │  • bulk_insert(collection, batch)                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ingest_engine::{IngestEngine, IngestConfig, Record, InMemoryStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = IngestConfig {
//!         collection: "vessel_metrics".into(),
//!         batch_size: 100,
//!         ..Default::default()
//!     };
//!
//!     let store = Arc::new(InMemoryStore::new());
//!     let mut engine = IngestEngine::new(config, store);
//!
//!     engine.start().await.expect("Failed to start");
//!
//!     let record = Record::new(json!({
//!         "path": "propulsion.engine.rpm",
//!         "value": 1450.0,
//!     }));
//!     if let Err(e) = engine.send(record).await {
//!         eprintln!("record dropped: {e}");
//!     }
//!
//!     engine.stop().await;
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **Dedup**: byte-identical payloads collapse to one buffer slot
//!   (last-write-wins). This is the intended dedup behavior.
//! - **Bounded memory**: the buffer rejects (never evicts) past capacity.
//! - **Single-flight**: one flush at a time, even when the periodic tick
//!   and a threshold-crossing send race.
//! - **At-least-once per batch, bounded**: failed batch writes are
//!   re-queued up to a retry budget, then dropped and counted.
//! - **No persistence**: the buffer is in-memory only; unflushed records
//!   are lost on process restart.
//!
//! ## Modules
//!
//! - [`engine`]: the [`IngestEngine`] facade (`start` / `send` / `stop`)
//! - [`buffer`]: bounded, deduplicating, TTL-bounded staging
//! - [`scheduler`]: batch drain/write loop and housekeeping
//! - [`connection`]: store connection ownership and retry
//! - [`store`]: the [`StoreClient`] seam and the in-memory implementation
//! - [`fingerprint`]: payload identity hashing
//! - [`resilience`]: retry with exponential backoff

pub mod buffer;
pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod metrics;
pub mod record;
pub mod resilience;
pub mod scheduler;
pub mod store;

pub use buffer::IngestBuffer;
pub use config::IngestConfig;
pub use connection::{ConnectionGuard, ConnectionState};
pub use engine::IngestEngine;
pub use error::IngestError;
pub use fingerprint::fingerprint;
pub use record::Record;
pub use resilience::retry::RetryConfig;
pub use scheduler::{FlushOutcome, FlushScheduler};
pub use store::memory::InMemoryStore;
pub use store::traits::{StoreClient, StoreError};
