//! Error taxonomy for the ingest engine.
//!
//! Everything here is reported to the caller as a value and logged through
//! `tracing`; nothing panics and nothing halts the host adapter. Connectivity
//! and capacity problems degrade ingestion (records are dropped) rather than
//! stopping it.

use thiserror::Error;

use crate::store::traits::StoreError;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Rejected configuration at startup.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// All connection attempts failed. Fatal to `start`, non-fatal to
    /// `send` (the next call retries the connection again).
    #[error("connection attempts exhausted after {attempts} tries")]
    ConnectionExhausted { attempts: usize },

    /// Buffer is full. The record was not staged; the caller sheds load.
    #[error("buffer at capacity ({capacity} records), record rejected")]
    CapacityExceeded { capacity: usize },

    /// The store rejected or failed a batch insert.
    #[error("batch write failed: {0}")]
    Write(#[from] StoreError),

    /// The record cannot be canonically serialized for fingerprinting.
    /// Dropped, never staged.
    #[error("record cannot be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}
