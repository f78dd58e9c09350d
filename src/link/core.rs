//! Link coordinator.
//!
//! The [`ModbusLink`] struct ties the connection manager, the exchange
//! engine and the heartbeat task together behind one cloneable handle.
//!
//! # Example
//!
//! ```no_run
//! use modbus_link::ModbusLink;
//!
//! # async fn example() -> modbus_link::Result<()> {
//! let link = ModbusLink::builder().host("192.168.1.35").port(502).build()?;
//! link.start().await;
//!
//! let result = link
//!     .exchange([0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x02, 0x2C, 0x00, 0x04], "pv meter")
//!     .await;
//! println!("{} {:?}", result.message(), result.response_hex());
//!
//! link.close().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::{Endpoint, LinkOptions};
use crate::error::Result;
use crate::exchange::{ExchangeEngine, ExchangeResult, Heartbeat, HeartbeatHandle, HeartbeatOutcome};
use crate::frame::Frame;
use crate::stats::{LinkStats, StatsSnapshot};
use crate::transport::{ConnectionManager, ConnectionStatus};

use super::builder::LinkBuilder;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the link.
pub(crate) struct LinkInner {
    /// Socket owner.
    pub manager: Arc<ConnectionManager>,

    /// Exchange and probe logic.
    pub engine: Arc<ExchangeEngine>,

    /// Running heartbeat task, if started.
    pub heartbeat: Mutex<Option<HeartbeatHandle>>,
}

// ============================================================================
// ModbusLink
// ============================================================================

/// Persistent link to one Modbus-TCP device.
///
/// The link is responsible for:
/// - Keeping one TCP connection to the configured endpoint
/// - Serializing exchanges from any number of callers
/// - Probing the connection on a fixed delay and resetting it when dead
///
/// Construct one link per device; clones share the same connection.
#[derive(Clone)]
pub struct ModbusLink {
    /// Shared inner state.
    pub(crate) inner: Arc<LinkInner>,
}

// ============================================================================
// ModbusLink - Display
// ============================================================================

impl fmt::Debug for ModbusLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModbusLink")
            .field("options", self.inner.manager.options())
            .field("heartbeat_running", &self.is_heartbeat_running())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ModbusLink - Public API
// ============================================================================

impl ModbusLink {
    /// Creates a configuration builder for the link.
    #[inline]
    #[must_use]
    pub fn builder() -> LinkBuilder {
        LinkBuilder::new()
    }

    /// Makes an initial connect attempt and starts the heartbeat.
    ///
    /// A failed initial connect is not an error: the heartbeat and the next
    /// exchange keep retrying. Calling `start` on a running link does
    /// nothing. Returns whether the link is connected afterwards.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(&self) -> bool {
        let connected = self.inner.manager.ensure_connected().await;
        let options = self.inner.manager.options();

        if options.heartbeat_enabled {
            let mut slot = self.inner.heartbeat.lock();
            if slot.as_ref().is_none_or(|h| !h.is_running()) {
                match Heartbeat::spawn(Arc::clone(&self.inner.engine), options.heartbeat_interval) {
                    Ok(handle) => *slot = Some(handle),
                    Err(e) => warn!(error = %e, "Heartbeat not started"),
                }
            }
        }

        info!(connected, "Link started");
        connected
    }

    /// Sends one frame and waits for its response.
    ///
    /// See [`ExchangeEngine::exchange`].
    pub async fn exchange(&self, frame: impl Into<Frame>, description: &str) -> ExchangeResult {
        self.inner.engine.exchange(frame, description).await
    }

    /// Returns `true` if a live connection is installed.
    pub async fn is_connected(&self) -> bool {
        self.inner.manager.is_connected().await
    }

    /// Points the link at a new device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for a blank host or a
    /// port outside `1..=65535`.
    pub async fn update_endpoint(&self, host: impl Into<String>, port: i64) -> Result<()> {
        self.inner.manager.update_endpoint(host, port).await
    }

    /// Returns the current endpoint and liveness.
    pub async fn connection_status(&self) -> ConnectionStatus {
        self.inner.manager.connection_status().await
    }

    /// Runs one heartbeat probe immediately.
    pub async fn heartbeat_now(&self) -> HeartbeatOutcome {
        self.inner.engine.heartbeat().await
    }

    /// Returns a copy of the link counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.manager.stats().snapshot()
    }

    /// Returns the link options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &LinkOptions {
        self.inner.manager.options()
    }

    /// Returns `true` while the heartbeat task is running.
    #[must_use]
    pub fn is_heartbeat_running(&self) -> bool {
        self.inner
            .heartbeat
            .lock()
            .as_ref()
            .is_some_and(HeartbeatHandle::is_running)
    }

    /// Stops the heartbeat and closes the connection.
    ///
    /// Safe to call more than once. The link can be started again.
    pub async fn close(&self) {
        let handle = self.inner.heartbeat.lock().take();
        if let Some(mut handle) = handle {
            handle.stop().await;
        }

        self.inner.manager.shutdown().await;
        info!("Link closed");
    }
}

// ============================================================================
// ModbusLink - Internal API
// ============================================================================

impl ModbusLink {
    /// Creates a link. No I/O happens until [`start`](Self::start) or the
    /// first exchange.
    pub(crate) fn new(endpoint: Endpoint, options: LinkOptions) -> Result<Self> {
        let stats = Arc::new(LinkStats::new());
        let manager = Arc::new(ConnectionManager::new(endpoint, options, stats)?);
        let engine = Arc::new(ExchangeEngine::new(Arc::clone(&manager)));

        Ok(Self {
            inner: Arc::new(LinkInner {
                manager,
                engine,
                heartbeat: Mutex::new(None),
            }),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::ModbusLink;

    #[test]
    fn test_builder_returns_link_builder() {
        let _builder = ModbusLink::builder();
    }

    #[test]
    fn test_link_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<ModbusLink>();
    }

    #[test]
    fn test_link_is_debug() {
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_debug::<ModbusLink>();
    }

    #[tokio::test]
    async fn test_close_without_start() {
        let link = ModbusLink::builder().heartbeat(false).build().unwrap();
        link.close().await;
        assert!(!link.is_heartbeat_running());
        assert!(!link.is_connected().await);
    }
}
