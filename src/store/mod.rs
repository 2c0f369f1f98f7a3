//! Store client seam.
//!
//! The engine talks to the backing document store exclusively through the
//! [`StoreClient`](traits::StoreClient) trait; wire clients are provided by
//! the host. [`memory::InMemoryStore`] is the in-process implementation
//! used by tests and local development.

pub mod traits;
pub mod memory;
