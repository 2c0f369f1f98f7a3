//! Measurement record data structure.
//!
//! The [`Record`] is the unit that flows through the ingest engine: an
//! application payload plus the engine-assigned fields `observed_at`,
//! `expires_at` and `fingerprint`. Records are immutable once staged;
//! the buffer addresses them only by fingerprint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A timestamped measurement record.
///
/// # Example
///
/// ```
/// use ingest_engine::Record;
/// use serde_json::json;
///
/// let record = Record::new(json!({"path": "engine.room.temp", "value": 21.5}));
/// assert!(record.observed_at > 0);
/// assert_eq!(record.expires_at, 0); // assigned at staging time
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Application payload. Canonical identity source for dedup.
    pub payload: Value,
    /// Observation timestamp (epoch millis). Arrival time unless the
    /// producer supplied one via [`Record::with_observed_at`].
    pub observed_at: i64,
    /// Buffer residency deadline (epoch millis), always `now + ttl` at
    /// insertion. Governs expiry, not payload semantics.
    #[serde(default)]
    pub expires_at: i64,
    /// Dedup identity key, computed from the payload only.
    #[serde(default)]
    pub fingerprint: u64,
    /// Failed-flush re-queue counter (engine internal).
    #[serde(skip)]
    pub(crate) flush_attempts: u32,
}

impl Record {
    /// Create a record stamped with the current time as `observed_at`.
    pub fn new(payload: Value) -> Self {
        Self::with_observed_at(payload, epoch_millis())
    }

    /// Create a record with a producer-supplied observation timestamp.
    pub fn with_observed_at(payload: Value, observed_at: i64) -> Self {
        Self {
            payload,
            observed_at,
            expires_at: 0,
            fingerprint: 0,
            flush_attempts: 0,
        }
    }

    /// Whether the record's buffer residency has expired.
    #[must_use]
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at < now_ms
    }
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn epoch_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_stamps_arrival_time() {
        let before = epoch_millis();
        let record = Record::new(json!({"value": 1}));
        let after = epoch_millis();

        assert!(record.observed_at >= before);
        assert!(record.observed_at <= after);
        assert_eq!(record.expires_at, 0);
        assert_eq!(record.fingerprint, 0);
    }

    #[test]
    fn test_producer_supplied_timestamp_kept() {
        let record = Record::with_observed_at(json!({"value": 1}), 1_700_000_000_000);
        assert_eq!(record.observed_at, 1_700_000_000_000);
    }

    #[test]
    fn test_expiry_check() {
        let mut record = Record::new(json!({}));
        record.expires_at = 100;

        assert!(!record.is_expired(100));
        assert!(record.is_expired(101));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut record = Record::with_observed_at(json!({"nested": {"k": [1, 2]}}), 42);
        record.expires_at = 99;
        record.fingerprint = 7;

        let json_str = serde_json::to_string(&record).unwrap();
        let back: Record = serde_json::from_str(&json_str).unwrap();

        assert_eq!(back.payload, record.payload);
        assert_eq!(back.observed_at, 42);
        assert_eq!(back.expires_at, 99);
        assert_eq!(back.fingerprint, 7);
    }

    #[test]
    fn test_flush_attempts_not_serialized() {
        let mut record = Record::new(json!({}));
        record.flush_attempts = 3;

        let json_str = serde_json::to_string(&record).unwrap();
        assert!(!json_str.contains("flush_attempts"));
    }
}
