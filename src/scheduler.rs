// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Flush scheduling: draining the buffer into bounded batches and writing
//! them through the connection guard.
//!
//! At most one flush runs at a time system-wide. The single-flight gate is
//! a `tokio::sync::Mutex<()>`: [`FlushScheduler::flush`] try-locks and
//! returns immediately when a flush is already running, while
//! [`FlushScheduler::flush_wait`] awaits the gate, which is how shutdown
//! waits for an in-flight flush before the connection closes.
//!
//! A flush never reconnects; when the guard reports `Disconnected` it is a
//! no-op. Reconnection happens only on the send path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::buffer::IngestBuffer;
use crate::connection::ConnectionGuard;
use crate::record::epoch_millis;
use crate::store::traits::StoreError;

/// What a flush invocation did.
#[derive(Debug)]
pub enum FlushOutcome {
    /// All computed batches written
    Flushed { batches: usize, records: usize },
    /// A batch write failed; the remaining iterations were abandoned and
    /// the drained batch re-queued (bounded by `max_flush_retries`)
    Failed { batches: usize, records: usize, error: StoreError },
    /// Buffer was empty
    Empty,
    /// Connection guard reported `Disconnected`
    Disconnected,
    /// Another flush was already running
    InFlight,
}

impl FlushOutcome {
    /// Records actually written by this invocation.
    #[must_use]
    pub fn records_written(&self) -> usize {
        match self {
            Self::Flushed { records, .. } | Self::Failed { records, .. } => *records,
            _ => 0,
        }
    }
}

pub struct FlushScheduler {
    buffer: Arc<IngestBuffer>,
    connection: Arc<ConnectionGuard>,
    collection: String,
    batch_size: usize,
    /// `None` when the periodic trigger is disabled (`flush_interval_ms == 0`)
    flush_interval: Option<Duration>,
    max_flush_retries: u32,
    /// Single-flight gate; also what `stop` waits on
    flush_gate: tokio::sync::Mutex<()>,
    next_deadline: Mutex<Instant>,
}

impl FlushScheduler {
    pub fn new(
        buffer: Arc<IngestBuffer>,
        connection: Arc<ConnectionGuard>,
        collection: String,
        batch_size: usize,
        flush_interval_ms: u64,
        max_flush_retries: u32,
    ) -> Self {
        let flush_interval = (flush_interval_ms > 0)
            .then(|| Duration::from_millis(flush_interval_ms));
        let next_deadline = Instant::now() + flush_interval.unwrap_or(Duration::ZERO);
        Self {
            buffer,
            connection,
            collection,
            batch_size,
            flush_interval,
            max_flush_retries,
            flush_gate: tokio::sync::Mutex::new(()),
            next_deadline: Mutex::new(next_deadline),
        }
    }

    /// The next periodic flush deadline, `None` when disabled.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.flush_interval.map(|_| *self.next_deadline.lock())
    }

    /// Whether the size-or-deadline trigger currently holds.
    #[must_use]
    pub fn should_flush(&self) -> bool {
        self.buffer
            .should_flush(Instant::now(), self.batch_size, self.deadline())
    }

    /// Run a flush unless one is already in flight.
    pub async fn flush(&self) -> FlushOutcome {
        let Ok(_gate) = self.flush_gate.try_lock() else {
            return FlushOutcome::InFlight;
        };
        self.run_flush().await
    }

    /// Run a flush, waiting for any in-flight flush to finish first.
    /// Used by shutdown for the best-effort final drain.
    pub async fn flush_wait(&self) -> FlushOutcome {
        let _gate = self.flush_gate.lock().await;
        self.run_flush().await
    }

    /// Periodic maintenance: expire stale records, then flush if the
    /// deadline passed.
    pub async fn housekeeping(&self) {
        let swept = self.buffer.sweep_expired(epoch_millis());
        if swept > 0 {
            info!(swept, "Expired records dropped from buffer");
            crate::metrics::record_swept(swept);
        }
        crate::metrics::set_buffer_len(self.buffer.len());

        if self.deadline().is_some_and(|d| Instant::now() > d) {
            self.flush().await;
        }
    }

    /// The flush algorithm. Caller holds the single-flight gate.
    async fn run_flush(&self) -> FlushOutcome {
        if !self.connection.is_connected() {
            return FlushOutcome::Disconnected;
        }
        let staged = self.buffer.len();
        if staged == 0 {
            self.advance_deadline();
            return FlushOutcome::Empty;
        }

        let start = Instant::now();
        // Bound this invocation to what was staged when it began; records
        // arriving mid-flush wait for the next cycle.
        let batch_count = staged.div_ceil(self.batch_size);
        debug!(staged, batch_count, "Flush started");

        let mut batches = 0;
        let mut records = 0;

        for _ in 0..batch_count {
            let batch = self.buffer.drain_up_to(self.batch_size);
            if batch.is_empty() {
                break;
            }
            match self.connection.bulk_insert(&self.collection, &batch).await {
                Ok(written) => {
                    self.buffer.settle_drained(batch.len());
                    batches += 1;
                    records += written;
                }
                Err(error) => {
                    warn!(error = %error, batch_size = batch.len(), "Batch write failed, re-queueing");
                    crate::metrics::record_flush_error();
                    self.requeue_failed(batch);
                    self.advance_deadline();
                    crate::metrics::set_buffer_len(self.buffer.len());
                    return FlushOutcome::Failed { batches, records, error };
                }
            }
        }

        self.advance_deadline();
        crate::metrics::record_flush(batches, records, start.elapsed());
        crate::metrics::set_buffer_len(self.buffer.len());
        info!(batches, records, "Flush complete");
        FlushOutcome::Flushed { batches, records }
    }

    /// Re-queue a drained batch after a failed write, dropping records that
    /// have exhausted their retry budget.
    fn requeue_failed(&self, batch: Vec<crate::record::Record>) {
        let mut kept = Vec::with_capacity(batch.len());
        let mut dropped = 0usize;
        for mut record in batch {
            record.flush_attempts += 1;
            if record.flush_attempts < self.max_flush_retries {
                kept.push(record);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(dropped, "Records dropped after exhausting flush retries");
            self.buffer.settle_drained(dropped);
            for _ in 0..dropped {
                crate::metrics::record_dropped("retry_exhausted");
            }
        }
        self.buffer.requeue_front(kept);
    }

    fn advance_deadline(&self) {
        if let Some(interval) = self.flush_interval {
            *self.next_deadline.lock() = Instant::now() + interval;
        }
    }
}
