// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bounded, deduplicating, TTL-bounded staging buffer.
//!
//! The [`IngestBuffer`] maps fingerprints to records. Insertion order is
//! tracked for oldest-first expiry and drain scans. All map mutation
//! happens under an internal mutex; the lock is never held across an
//! await, so drained batches are written to the store lock-free.
//!
//! Capacity is enforced by rejection: a new fingerprint arriving at a full
//! buffer returns [`IngestError::CapacityExceeded`] instead of evicting.
//! An overwrite of an existing fingerprint is always accepted (it does not
//! grow the buffer) and keeps the slot's original position.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::IngestError;
use crate::fingerprint::fingerprint;
use crate::record::{epoch_millis, Record};

pub struct IngestBuffer {
    max_capacity: usize,
    ttl_ms: u64,
    inner: Mutex<BufferInner>,
}

struct BufferInner {
    entries: HashMap<u64, Record>,
    /// Fingerprints in insertion order. May contain stale keys after a
    /// sweep; drain skips them and sweep compacts.
    order: VecDeque<u64>,
    /// Records drained for a write still in flight. They keep their
    /// capacity reservation until settled or re-queued, so a failed write
    /// can always re-admit its batch without breaching `max_capacity`.
    in_flight: usize,
}

impl IngestBuffer {
    pub fn new(max_capacity: usize, ttl_ms: u64) -> Self {
        Self {
            max_capacity,
            ttl_ms,
            inner: Mutex::new(BufferInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                in_flight: 0,
            }),
        }
    }

    /// Stage a record: assign `expires_at`, compute the fingerprint, check
    /// capacity, insert or overwrite. Returns the fingerprint.
    pub fn put(&self, mut record: Record) -> Result<u64, IngestError> {
        let fp = fingerprint(&record.payload)?;
        record.fingerprint = fp;
        // TTL is measured from insertion, independent of observed_at.
        record.expires_at = epoch_millis() + self.ttl_ms as i64;

        let mut inner = self.inner.lock();
        if let std::collections::hash_map::Entry::Occupied(mut slot) = inner.entries.entry(fp) {
            // Last-write-wins: identical payload, fresher residency.
            slot.insert(record);
            trace!(fingerprint = fp, "Staged record overwrote existing slot");
            return Ok(fp);
        }
        if inner.entries.len() + inner.in_flight >= self.max_capacity {
            return Err(IngestError::CapacityExceeded {
                capacity: self.max_capacity,
            });
        }
        inner.entries.insert(fp, record);
        inner.order.push_back(fp);
        trace!(fingerprint = fp, size = inner.entries.len(), "Staged record");
        Ok(fp)
    }

    /// Remove every entry whose residency expired before `now_ms`.
    /// Returns the count removed (diagnostic only).
    pub fn sweep_expired(&self, now_ms: i64) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, record| !record.is_expired(now_ms));
        let removed = before - inner.entries.len();
        if removed > 0 {
            // Compact stale keys so the order queue tracks the map.
            let live: std::collections::HashSet<u64> = inner.entries.keys().copied().collect();
            inner.order.retain(|fp| live.contains(fp));
        }
        removed
    }

    /// Size OR deadline flush trigger. `deadline` is `None` when the
    /// periodic trigger is disabled.
    #[must_use]
    pub fn should_flush(&self, now: Instant, batch_size: usize, deadline: Option<Instant>) -> bool {
        self.len() >= batch_size || deadline.is_some_and(|d| now > d)
    }

    /// Remove and return up to `n` records in insertion order.
    ///
    /// Removal is eager (pessimistic): a failed write must re-queue the
    /// batch via [`requeue_front`](Self::requeue_front), the records are
    /// not assumed to still be staged. The drained records keep their
    /// capacity reservation until [`settle_drained`](Self::settle_drained)
    /// or the re-queue releases it.
    pub fn drain_up_to(&self, n: usize) -> Vec<Record> {
        let mut inner = self.inner.lock();
        let mut batch = Vec::with_capacity(n.min(inner.entries.len()));
        while batch.len() < n {
            let Some(fp) = inner.order.pop_front() else { break };
            // Stale keys left behind by a sweep are skipped here.
            if let Some(record) = inner.entries.remove(&fp) {
                batch.push(record);
            }
        }
        inner.in_flight += batch.len();
        batch
    }

    /// Release the capacity reservation for `n` drained records that were
    /// written or dropped and will not come back.
    pub fn settle_drained(&self, n: usize) {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(n);
    }

    /// Re-insert a drained-but-unwritten batch at the front of the buffer,
    /// preserving oldest-first order, and release its capacity reservation.
    /// A newer duplicate staged while the flush was in flight wins over the
    /// re-queued copy.
    pub fn requeue_front(&self, records: Vec<Record>) {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(records.len());
        for record in records.into_iter().rev() {
            let fp = record.fingerprint;
            if inner.entries.contains_key(&fp) {
                continue;
            }
            inner.entries.insert(fp, record);
            inner.order.push_front(fp);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a fingerprint is currently staged.
    #[must_use]
    pub fn contains(&self, fp: u64) -> bool {
        self.inner.lock().entries.contains_key(&fp)
    }
}
