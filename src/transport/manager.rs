//! Connection lifecycle and endpoint configuration.
//!
//! The [`ConnectionManager`] keeps zero or one live [`Connection`] to the
//! current [`Endpoint`]. Both live behind a single async mutex:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  ConnectionManager           │
//! │  Mutex<LinkState>            │
//! │   ├─ endpoint: Endpoint      │
//! │   └─ connection: Option<..>  │
//! └──────────────────────────────┘
//! ```
//!
//! Every operation that reads or swaps the connection takes that lock, so
//! a half-closed socket is never handed to a caller mid-swap and a config
//! update can never race an exchange that is still using the old endpoint.
//! Callers that need several steps under one critical section (the
//! exchange engine) hold a [`LinkGuard`] across them.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::{Endpoint, LinkOptions};
use crate::error::{Error, Result};
use crate::stats::LinkStats;

use super::Connection;

// ============================================================================
// ConnectionStatus
// ============================================================================

/// Snapshot of the link for external reporting.
///
/// Serializes as `{"host": .., "port": .., "connected": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    /// Endpoint at snapshot time.
    #[serde(flatten)]
    pub endpoint: Endpoint,
    /// Whether a live connection was installed at snapshot time.
    pub connected: bool,
}

// ============================================================================
// LinkState
// ============================================================================

/// State guarded by the manager lock.
struct LinkState {
    endpoint: Endpoint,
    connection: Option<Connection>,
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Owns the socket and the endpoint it points at.
///
/// Cheap operations (`is_connected`, `connection_status`) still take the
/// lock, so they wait for an exchange in progress to finish.
pub struct ConnectionManager {
    /// Endpoint and connection, swapped atomically.
    state: Mutex<LinkState>,
    /// Timeouts applied to new connections.
    options: LinkOptions,
    /// Shared counters.
    stats: Arc<LinkStats>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ConnectionManager - Constructor
// ============================================================================

impl ConnectionManager {
    /// Creates a disconnected manager for `endpoint`.
    ///
    /// No I/O happens until the first [`connect`](Self::connect) or
    /// [`ensure_connected`](Self::ensure_connected).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `options` fail
    /// [`LinkOptions::validate`].
    pub fn new(endpoint: Endpoint, options: LinkOptions, stats: Arc<LinkStats>) -> Result<Self> {
        options.validate()?;
        debug!(%endpoint, "ConnectionManager created, waiting for first connect");

        Ok(Self {
            state: Mutex::new(LinkState {
                endpoint,
                connection: None,
            }),
            options,
            stats,
        })
    }
}

// ============================================================================
// ConnectionManager - Public API
// ============================================================================

impl ConnectionManager {
    /// Locks the link for a multi-step operation.
    ///
    /// The returned guard is the only way to reach the live connection.
    pub async fn lock(&self) -> LinkGuard<'_> {
        LinkGuard {
            state: self.state.lock().await,
            manager: self,
        }
    }

    /// Drops any existing connection and opens a fresh one.
    ///
    /// Returns `false` on any failure; never errors.
    pub async fn connect(&self) -> bool {
        self.lock().await.connect().await
    }

    /// Returns `true` if connected, otherwise makes exactly one connect attempt.
    pub async fn ensure_connected(&self) -> bool {
        self.lock().await.ensure_connected().await
    }

    /// Returns `true` if a live connection is installed.
    pub async fn is_connected(&self) -> bool {
        self.lock().await.is_connected()
    }

    /// Returns the current endpoint.
    pub async fn endpoint(&self) -> Endpoint {
        self.lock().await.endpoint().clone()
    }

    /// Points the link at a new endpoint.
    ///
    /// If the endpoint changed, the current connection is closed and one
    /// reconnect attempt is made; a failed reconnect is logged, not returned.
    /// An unchanged endpoint is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is blank or the port is outside
    /// `1..=65535`. The link is left untouched in that case.
    pub async fn update_endpoint(&self, host: impl Into<String>, port: i64) -> Result<()> {
        let endpoint = Endpoint::new(host, port)?;
        let mut link = self.lock().await;

        if *link.endpoint() == endpoint {
            info!(%endpoint, "Endpoint unchanged, ignoring update");
            return Ok(());
        }

        info!(from = %link.endpoint(), to = %endpoint, "Endpoint changed");

        link.close().await;
        link.state.endpoint = endpoint;
        link.connect().await;

        Ok(())
    }

    /// Returns a snapshot of endpoint and liveness.
    pub async fn connection_status(&self) -> ConnectionStatus {
        let link = self.lock().await;
        ConnectionStatus {
            endpoint: link.endpoint().clone(),
            connected: link.is_connected(),
        }
    }

    /// Closes any live connection. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        self.lock().await.close().await;
        info!("Connection manager shut down");
    }

    /// Returns the options applied to new connections.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &LinkOptions {
        &self.options
    }

    /// Returns the shared counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &Arc<LinkStats> {
        &self.stats
    }
}

// ============================================================================
// LinkGuard
// ============================================================================

/// Exclusive access to the link state.
///
/// Holding a guard blocks every other manager operation. Keep it for the
/// duration of one exchange, no longer.
pub struct LinkGuard<'a> {
    state: MutexGuard<'a, LinkState>,
    manager: &'a ConnectionManager,
}

impl LinkGuard<'_> {
    /// Returns the current endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.state.endpoint
    }

    /// Returns `true` if a live connection is installed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state
            .connection
            .as_ref()
            .is_some_and(Connection::is_alive)
    }

    /// Drops any existing connection and opens a fresh one.
    pub async fn connect(&mut self) -> bool {
        self.close().await;

        let options = &self.manager.options;
        let endpoint = &self.state.endpoint;

        match Connection::open(endpoint, options.connect_timeout, options.read_timeout).await {
            Ok(connection) => {
                info!(%endpoint, id = %connection.id(), "Connected");
                self.manager.stats.record_connect();
                self.state.connection = Some(connection);
                true
            }
            Err(e) => {
                warn!(%endpoint, error = %e, timed_out = e.is_timeout(), "Connect failed");
                self.manager.stats.record_connect_failure();
                false
            }
        }
    }

    /// Returns `true` if connected, otherwise makes exactly one connect attempt.
    pub async fn ensure_connected(&mut self) -> bool {
        if self.is_connected() {
            return true;
        }

        warn!(endpoint = %self.state.endpoint, "Not connected, attempting reconnect");
        self.connect().await
    }

    /// Returns the live connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if no live connection is installed.
    pub fn connection(&mut self) -> Result<&mut Connection> {
        match self.state.connection.as_mut() {
            Some(connection) if connection.is_alive() => Ok(connection),
            _ => Err(Error::NotConnected),
        }
    }

    /// Closes and removes the current connection, if any.
    pub async fn close(&mut self) {
        if let Some(connection) = self.state.connection.take() {
            connection.close().await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
