// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Ingest engine facade.
//!
//! The [`IngestEngine`] composes the buffer, connection guard and flush
//! scheduler into the three-call surface the host adapter uses:
//! [`start`](IngestEngine::start), [`send`](IngestEngine::send),
//! [`stop`](IngestEngine::stop).
//!
//! # Lifecycle
//!
//! ```text
//! new → start (connect + arm housekeeping tick) → send ... → stop
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ingest_engine::{IngestEngine, IngestConfig, Record, InMemoryStore};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(InMemoryStore::new());
//! let mut engine = IngestEngine::new(IngestConfig::default(), store);
//!
//! engine.start().await.expect("store unreachable");
//! engine.send(Record::new(json!({"path": "engine.rpm", "value": 1450}))).await.ok();
//! engine.stop().await;
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::buffer::IngestBuffer;
use crate::config::IngestConfig;
use crate::connection::ConnectionGuard;
use crate::error::IngestError;
use crate::record::Record;
use crate::resilience::retry::RetryConfig;
use crate::scheduler::FlushScheduler;
use crate::store::traits::StoreClient;

pub struct IngestEngine {
    buffer: Arc<IngestBuffer>,
    connection: Arc<ConnectionGuard>,
    scheduler: Arc<FlushScheduler>,
    config: IngestConfig,
    shutdown: watch::Sender<bool>,
    tick_task: Option<JoinHandle<()>>,
}

impl IngestEngine {
    /// Create an engine over an injected store client.
    ///
    /// The client owns URI/auth resolution and the wire protocol; the
    /// engine only connects, bulk-inserts and closes through it.
    pub fn new(config: IngestConfig, client: Arc<dyn StoreClient>) -> Self {
        let retry = RetryConfig::connect(
            config.connect_max_attempts,
            Duration::from_millis(config.connect_base_delay_ms),
        );
        let buffer = Arc::new(IngestBuffer::new(config.max_capacity, config.ttl_ms));
        let connection = Arc::new(ConnectionGuard::new(client, retry));
        let scheduler = Arc::new(FlushScheduler::new(
            buffer.clone(),
            connection.clone(),
            config.collection.clone(),
            config.batch_size,
            config.flush_interval_ms,
            config.max_flush_retries,
        ));
        let (shutdown, _) = watch::channel(false);

        Self {
            buffer,
            connection,
            scheduler,
            config,
            shutdown,
            tick_task: None,
        }
    }

    /// Validate the configuration, connect to the store and arm the
    /// periodic housekeeping tick.
    ///
    /// Connection exhaustion here is fatal; the host should treat the
    /// engine as not started.
    pub async fn start(&mut self) -> Result<(), IngestError> {
        self.config.validate()?;
        info!(
            collection = %self.config.collection,
            batch_size = self.config.batch_size,
            max_capacity = self.config.max_capacity,
            "Starting ingest engine"
        );

        self.connection.connect().await?;

        let scheduler = self.scheduler.clone();
        let mut shutdown_rx = self.shutdown.subscribe();
        let tick = Duration::from_millis(self.config.housekeeping_interval_ms);
        self.tick_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first interval tick fires immediately; harmless on an
            // empty buffer.
            loop {
                tokio::select! {
                    _ = interval.tick() => scheduler.housekeeping().await,
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!("Housekeeping task stopped");
        }));

        info!("Ingest engine started");
        Ok(())
    }

    /// Stage a record, flushing synchronously if the size-or-deadline
    /// trigger now holds.
    ///
    /// Failures come back as values, never panics: the host adapter keeps
    /// dispatching subsequent events regardless of storage health. A
    /// record is staged only when the store is reachable; each call lazily
    /// retries the connection once if needed.
    pub async fn send(&self, record: Record) -> Result<u64, IngestError> {
        if let Err(err) = self.connection.ensure_connected().await {
            warn!(error = %err, "Store unreachable, record not staged");
            crate::metrics::record_dropped("disconnected");
            return Err(err);
        }

        let fp = match self.buffer.put(record) {
            Ok(fp) => fp,
            Err(err) => {
                warn!(error = %err, "Record rejected");
                match &err {
                    IngestError::CapacityExceeded { .. } => {
                        crate::metrics::record_dropped("capacity")
                    }
                    _ => crate::metrics::record_dropped("serialization"),
                }
                return Err(err);
            }
        };
        crate::metrics::record_staged();
        crate::metrics::set_buffer_len(self.buffer.len());

        // A burst that crosses the threshold flushes promptly instead of
        // waiting for the next housekeeping tick. If a flush is already in
        // flight the scheduler returns immediately.
        if self.scheduler.should_flush() {
            self.scheduler.flush().await;
        }

        Ok(fp)
    }

    /// Disarm the tick, run one best-effort final flush (waiting for any
    /// in-flight flush first), then close the connection. Idempotent.
    pub async fn stop(&mut self) {
        info!("Stopping ingest engine");
        let _ = self.shutdown.send(true);
        if let Some(task) = self.tick_task.take() {
            let _ = task.await;
        }

        self.scheduler.flush_wait().await;
        self.connection.close().await;
        info!(remaining = self.buffer.len(), "Ingest engine stopped");
    }

    /// Current buffer occupancy.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the store connection is currently established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }
}
