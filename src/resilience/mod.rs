//! Resilience primitives: connection retry with exponential backoff.

pub mod retry;
