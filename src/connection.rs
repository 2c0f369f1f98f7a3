// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Store connection ownership.
//!
//! The [`ConnectionGuard`] is the single owner of the store connection
//! state: it connects with retry, answers "are we connected", and closes.
//! The buffer's send path uses it for lazy reconnection; the flush
//! scheduler only observes it (flush never reconnects, so reconnection
//! policy lives in exactly one place).

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::record::Record;
use crate::resilience::retry::{retry, RetryConfig};
use crate::store::traits::{StoreClient, StoreError};

/// Connection state, owned exclusively by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

pub struct ConnectionGuard {
    client: Arc<dyn StoreClient>,
    state: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    /// Serializes concurrent connect attempts so a burst of sends does not
    /// stampede the store with parallel handshakes.
    connect_lock: Mutex<()>,
    retry_config: RetryConfig,
}

impl ConnectionGuard {
    pub fn new(client: Arc<dyn StoreClient>, retry_config: RetryConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            client,
            state: state_tx,
            state_rx,
            connect_lock: Mutex::new(()),
            retry_config,
        }
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Connect with the guard's retry policy.
    ///
    /// On exhaustion the state is left `Disconnected` and
    /// [`IngestError::ConnectionExhausted`] is returned.
    pub async fn connect(&self) -> Result<(), IngestError> {
        let _lock = self.connect_lock.lock().await;
        if self.is_connected() {
            return Ok(());
        }
        self.connect_locked().await
    }

    /// If not connected, run one connect sequence. Used lazily by the send
    /// path so a transient outage at startup does not block record
    /// acceptance indefinitely; each send self-heals once per call.
    pub async fn ensure_connected(&self) -> Result<(), IngestError> {
        if self.is_connected() {
            return Ok(());
        }
        let _lock = self.connect_lock.lock().await;
        // Another caller may have connected while we waited for the lock.
        if self.is_connected() {
            return Ok(());
        }
        self.connect_locked().await
    }

    async fn connect_locked(&self) -> Result<(), IngestError> {
        let _ = self.state.send(ConnectionState::Connecting);
        debug!(attempts = self.retry_config.max_retries, "Connecting to store");

        match retry("store_connect", &self.retry_config, || self.client.connect()).await {
            Ok(()) => {
                let _ = self.state.send(ConnectionState::Connected);
                info!("Store connection established");
                crate::metrics::set_store_connected(true);
                Ok(())
            }
            Err(err) => {
                let _ = self.state.send(ConnectionState::Disconnected);
                warn!(error = %err, "Store connection attempts exhausted");
                crate::metrics::set_store_connected(false);
                crate::metrics::record_connect_exhausted();
                Err(IngestError::ConnectionExhausted {
                    attempts: self.retry_config.max_retries,
                })
            }
        }
    }

    /// Bulk-insert a batch through the underlying client.
    ///
    /// A transport-level failure flips the state to `Disconnected` so the
    /// next send reconnects; a store-side write rejection leaves it alone.
    pub async fn bulk_insert(
        &self,
        collection: &str,
        records: &[Record],
    ) -> Result<usize, StoreError> {
        match self.client.bulk_insert(collection, records).await {
            Ok(written) => Ok(written),
            Err(err) => {
                if matches!(err, StoreError::Connection(_)) {
                    let _ = self.state.send(ConnectionState::Disconnected);
                    crate::metrics::set_store_connected(false);
                }
                Err(err)
            }
        }
    }

    /// Release the underlying handle. Idempotent.
    pub async fn close(&self) {
        self.client.close().await;
        let _ = self.state.send(ConnectionState::Disconnected);
        crate::metrics::set_store_connected(false);
        debug!("Store connection closed");
    }
}
