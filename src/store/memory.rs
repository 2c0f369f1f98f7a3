use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::record::Record;
use super::traits::{StoreClient, StoreError};

/// In-memory store client for tests and local runs.
///
/// Records every bulk insert it receives, per collection and in arrival
/// order, so tests can assert on exact batch boundaries.
pub struct InMemoryStore {
    collections: DashMap<String, Vec<Record>>,
    batches: Mutex<Vec<usize>>,
    connected: AtomicBool,
    refuse_connect: AtomicBool,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            batches: Mutex::new(Vec::new()),
            connected: AtomicBool::new(false),
            refuse_connect: AtomicBool::new(false),
        }
    }

    /// Make subsequent `connect` calls fail (simulates store outage).
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse_connect.store(refuse, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Total documents written to a collection.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.len())
    }

    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Sizes of the bulk-insert batches received, in arrival order.
    #[must_use]
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().clone()
    }

    /// All documents written to a collection, in write order.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Record> {
        self.collections.get(collection).map_or_else(Vec::new, |c| c.clone())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn connect(&self) -> Result<(), StoreError> {
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("store unreachable".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn bulk_insert(
        &self,
        collection: &str,
        records: &[Record],
    ) -> Result<usize, StoreError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("not connected".into()));
        }
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend_from_slice(records);
        self.batches.lock().push(records.len());
        Ok(records.len())
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(i: u32) -> Record {
        Record::new(json!({"seq": i}))
    }

    #[tokio::test]
    async fn test_insert_requires_connection() {
        let store = InMemoryStore::new();
        let result = store.bulk_insert("m", &[record(1)]).await;
        assert!(matches!(result, Err(StoreError::Connection(_))));

        store.connect().await.unwrap();
        assert_eq!(store.bulk_insert("m", &[record(1)]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_records_batch_sizes() {
        let store = InMemoryStore::new();
        store.connect().await.unwrap();

        store.bulk_insert("m", &[record(1), record(2)]).await.unwrap();
        store.bulk_insert("m", &[record(3)]).await.unwrap();

        assert_eq!(store.batch_sizes(), vec![2, 1]);
        assert_eq!(store.len("m"), 3);
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let store = InMemoryStore::new();
        store.connect().await.unwrap();

        store.bulk_insert("a", &[record(1)]).await.unwrap();
        store.bulk_insert("b", &[record(2), record(3)]).await.unwrap();

        assert_eq!(store.len("a"), 1);
        assert_eq!(store.len("b"), 2);
        assert!(store.is_empty("c"));
    }

    #[tokio::test]
    async fn test_refuse_connections() {
        let store = InMemoryStore::new();
        store.refuse_connections(true);
        assert!(store.connect().await.is_err());
        assert!(!store.is_connected());

        store.refuse_connections(false);
        store.connect().await.unwrap();
        assert!(store.is_connected());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let store = InMemoryStore::new();
        store.connect().await.unwrap();
        store.close().await;
        store.close().await;
        assert!(!store.is_connected());
    }
}
