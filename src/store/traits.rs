use async_trait::async_trait;
use thiserror::Error;

use crate::record::Record;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("write rejected: {0}")]
    Write(String),
}

/// Minimal surface the engine needs from a document store client.
///
/// The real wire client (connection URI resolution, auth, timeouts) lives
/// outside this crate; the engine only ever connects, bulk-inserts a batch
/// of records into a named collection, and closes.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Establish (or re-establish) the underlying connection.
    async fn connect(&self) -> Result<(), StoreError>;

    /// Insert a batch of records into the named collection.
    /// Returns the number of documents written.
    async fn bulk_insert(&self, collection: &str, records: &[Record])
        -> Result<usize, StoreError>;

    /// Release the underlying connection. Must be idempotent.
    async fn close(&self);
}
