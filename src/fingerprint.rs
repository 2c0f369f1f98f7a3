// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Deduplication fingerprints.
//!
//! A fingerprint is a deterministic identity key derived from a record's
//! canonical serialized payload. Two records whose payloads serialize to the
//! same bytes get the same fingerprint and collapse into one buffer slot.
//!
//! The key is built from two independent 32-bit rolling hashes with
//! different seed constants, scanned over the canonical string in reverse,
//! and combined as `h1 * 2^12 + h2` in unsigned 64-bit arithmetic. Cheap and
//! collision-tolerant at typical batch sizes (hundreds to thousands of
//! staged entries); deliberately not cryptographic.
//!
//! Engine-assigned timestamps never participate in the hash, otherwise
//! every record would be unique and dedup would never fire.

use serde_json::Value;

const SEED_A: u32 = 5381;
const SEED_B: u32 = 52711;

/// Compute the dedup fingerprint for a payload.
///
/// Fails only if the payload cannot be canonically serialized; the caller
/// drops such records without staging them.
pub fn fingerprint(payload: &Value) -> Result<u64, serde_json::Error> {
    let canonical = serde_json::to_string(payload)?;
    Ok(combine(
        rolling_hash(canonical.as_bytes(), SEED_A),
        rolling_hash(canonical.as_bytes(), SEED_B),
    ))
}

/// 32-bit rolling hash over the bytes scanned in reverse.
fn rolling_hash(bytes: &[u8], seed: u32) -> u32 {
    let mut h = seed;
    for &b in bytes.iter().rev() {
        h = h.wrapping_mul(33) ^ u32::from(b);
    }
    h
}

/// Combine the two 32-bit hashes into one wider key.
#[inline]
fn combine(h1: u32, h2: u32) -> u64 {
    u64::from(h1) * 4096 + u64::from(h2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deterministic() {
        let payload = json!({"sensor": "temp-1", "value": 21.5});
        let a = fingerprint(&payload).unwrap();
        let b = fingerprint(&payload).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_payloads_collide() {
        let a = fingerprint(&json!({"path": "sys.cpu", "value": 42})).unwrap();
        let b = fingerprint(&json!({"path": "sys.cpu", "value": 42})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_payloads_differ() {
        let a = fingerprint(&json!({"path": "sys.cpu", "value": 42})).unwrap();
        let b = fingerprint(&json!({"path": "sys.cpu", "value": 43})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_order_is_canonicalized_away() {
        // Object keys serialize sorted, so insertion order never splits
        // what is semantically the same payload into two identities.
        let a = fingerprint(&json!({"a": 1, "b": 2})).unwrap();
        let b = fingerprint(&json!({"b": 2, "a": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seeds_are_independent() {
        let bytes = b"measurement";
        assert_ne!(rolling_hash(bytes, SEED_A), rolling_hash(bytes, SEED_B));
    }

    #[test]
    fn test_reverse_scan_distinguishes_rotations() {
        let a = rolling_hash(b"abc", SEED_A);
        let b = rolling_hash(b"cba", SEED_A);
        assert_ne!(a, b);
    }

    #[test]
    fn test_combine_widens() {
        let key = combine(u32::MAX, u32::MAX);
        assert!(key > u64::from(u32::MAX));
    }

    #[test]
    fn test_empty_payload_hashes() {
        let fp = fingerprint(&json!({})).unwrap();
        assert_ne!(fp, 0);
    }

    #[test]
    fn test_batch_sized_population_has_no_collisions() {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        for i in 0..2000 {
            let fp = fingerprint(&json!({"path": "sensor.reading", "seq": i})).unwrap();
            assert!(seen.insert(fp), "collision at record {}", i);
        }
    }
}
