//! Configuration for the ingest engine.
//!
//! # Example
//!
//! ```
//! use ingest_engine::IngestConfig;
//!
//! // Minimal config (uses defaults)
//! let config = IngestConfig::default();
//! assert_eq!(config.batch_size, 100);
//!
//! // Full config
//! let config = IngestConfig {
//!     collection: "vessel_metrics".into(),
//!     ttl_ms: 60_000,
//!     batch_size: 50,
//!     flush_interval_ms: 30_000,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;

use crate::error::IngestError;

/// Configuration for the ingest engine.
///
/// All fields have sensible defaults; at minimum you will usually set
/// `collection` to the target store collection.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Target collection name in the backing store
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Buffer residency TTL in milliseconds; expired records are swept
    /// and dropped, never flushed
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Records per bulk-insert batch; reaching this buffer size triggers
    /// an immediate flush
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Hard buffer capacity; insertion beyond this is rejected, not evicted
    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,

    /// Periodic flush deadline in milliseconds (0 disables the time
    /// trigger; size-triggered flush still applies)
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Housekeeping tick interval (expiry sweep + deadline check)
    #[serde(default = "default_housekeeping_interval_ms")]
    pub housekeeping_interval_ms: u64,

    /// Connection retry attempts before giving up
    #[serde(default = "default_connect_max_attempts")]
    pub connect_max_attempts: usize,

    /// Base delay for exponential connection backoff
    #[serde(default = "default_connect_base_delay_ms")]
    pub connect_base_delay_ms: u64,

    /// How many times a drained batch is re-queued after a failed write
    /// before its records are dropped
    #[serde(default = "default_max_flush_retries")]
    pub max_flush_retries: u32,
}

fn default_collection() -> String { "measurements".to_string() }
fn default_ttl_ms() -> u64 { 120_000 }
fn default_batch_size() -> usize { 100 }
fn default_max_capacity() -> usize { 1000 }
fn default_flush_interval_ms() -> u64 { 60_000 }
fn default_housekeeping_interval_ms() -> u64 { 30_000 }
fn default_connect_max_attempts() -> usize { 5 }
fn default_connect_base_delay_ms() -> u64 { 200 }
fn default_max_flush_retries() -> u32 { 3 }

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            ttl_ms: default_ttl_ms(),
            batch_size: default_batch_size(),
            max_capacity: default_max_capacity(),
            flush_interval_ms: default_flush_interval_ms(),
            housekeeping_interval_ms: default_housekeeping_interval_ms(),
            connect_max_attempts: default_connect_max_attempts(),
            connect_base_delay_ms: default_connect_base_delay_ms(),
            max_flush_retries: default_max_flush_retries(),
        }
    }
}

impl IngestConfig {
    /// Validate the configuration before the engine starts.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.collection.is_empty() {
            return Err(IngestError::Config("collection must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(IngestError::Config("batch_size must be at least 1".into()));
        }
        if self.max_capacity == 0 {
            return Err(IngestError::Config("max_capacity must be at least 1".into()));
        }
        if self.ttl_ms == 0 {
            return Err(IngestError::Config("ttl_ms must be non-zero".into()));
        }
        if self.housekeeping_interval_ms == 0 {
            return Err(IngestError::Config(
                "housekeeping_interval_ms must be non-zero".into(),
            ));
        }
        if self.connect_max_attempts == 0 {
            return Err(IngestError::Config(
                "connect_max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
