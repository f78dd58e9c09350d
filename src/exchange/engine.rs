//! Serialized request/response exchanges.
//!
//! # Exchange
//!
//! Each exchange holds the manager lock from start to finish:
//!
//! 1. ensure connected (one attempt)
//! 2. discard stale bytes, write frame, flush
//! 3. read one response chunk under the read timeout
//! 4. correlate response with request
//!
//! The protocol has no multiplexing, so request N+1 must not reach the wire
//! before response N has been read. Holding one lock across all four steps
//! is what guarantees that.
//!
//! # Failure handling
//!
//! | Failure | Result message | Connection |
//! |---------|----------------|------------|
//! | link down | `not connected` | - |
//! | timeout / end of stream | `<desc> → no response` | torn down |
//! | dropped mid-exchange | - | torn down by the next caller |
//! | write or read error | `<desc> → communication error: ..` | torn down |
//! | correlation mismatch | `validation failed` | kept |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::frame::{Frame, correlate, to_hex};
use crate::stats::LinkStats;
use crate::transport::{Connection, ConnectionManager};

use super::result::{EMPTY_FRAME, ExchangeResult, NOT_CONNECTED};

// ============================================================================
// Constants
// ============================================================================

/// Minimal "read one holding register" probe.
///
/// Transaction id 1, unit 1, function 0x03, start 0, quantity 1.
pub const HEARTBEAT_PROBE: [u8; 12] = [
    0x00, 0x01, // transaction id
    0x00, 0x00, // protocol id
    0x00, 0x06, // length
    0x01, // unit id
    0x03, // read holding registers
    0x00, 0x00, // start address
    0x00, 0x01, // quantity
];

// ============================================================================
// HeartbeatOutcome
// ============================================================================

/// What a single heartbeat did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    /// A real exchange completed recently; no probe sent.
    Skipped,
    /// Link down and the one reconnect attempt failed.
    Unreachable,
    /// Probe answered.
    Healthy,
    /// Probe unanswered or I/O failed; connection torn down.
    Failed,
}

// ============================================================================
// ExchangeEngine
// ============================================================================

/// Runs exchanges and heartbeats over a [`ConnectionManager`].
#[derive(Debug)]
pub struct ExchangeEngine {
    manager: Arc<ConnectionManager>,
    /// Completion time of the last real exchange that got a response.
    last_activity: Mutex<Option<Instant>>,
}

impl ExchangeEngine {
    /// Creates an engine over `manager`.
    #[must_use]
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self {
            manager,
            last_activity: Mutex::new(None),
        }
    }

    /// Returns the underlying connection manager.
    #[inline]
    #[must_use]
    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    #[inline]
    fn stats(&self) -> &LinkStats {
        self.manager.stats()
    }

    /// Sends `frame` and waits for its response.
    ///
    /// Never fails: every outcome, including transport errors, is reported
    /// in the returned [`ExchangeResult`]. Concurrent callers queue on the
    /// manager lock.
    ///
    /// Dropping the future after the frame went out leaves the connection
    /// marked in flight, so the next exchange reconnects instead of reading
    /// the abandoned response.
    pub async fn exchange(&self, frame: impl Into<Frame>, description: &str) -> ExchangeResult {
        let frame = frame.into();
        let request = frame.as_bytes();

        if frame.is_empty() {
            warn!(description, "Refusing to send empty frame");
            return ExchangeResult::failed(description, request, EMPTY_FRAME);
        }

        let mut link = self.manager.lock().await;

        if !link.ensure_connected().await {
            warn!(description, endpoint = %link.endpoint(), "Exchange skipped, link down");
            return ExchangeResult::failed(description, request, NOT_CONNECTED);
        }

        let mut buffer = vec![0u8; self.manager.options().recv_buffer_size];
        let outcome = match link.connection() {
            Ok(connection) => self.round_trip(connection, request, &mut buffer).await,
            Err(e) => return ExchangeResult::failed(description, request, e.to_string()),
        };

        match outcome {
            Ok(0) | Err(Error::ConnectionClosed) => {
                warn!(description, "No response, resetting connection");
                self.stats().record_no_response();
                link.close().await;
                ExchangeResult::failed(description, request, format!("{description} → no response"))
            }
            Ok(len) => {
                buffer.truncate(len);
                self.stats().record_response();
                *self.last_activity.lock() = Some(Instant::now());

                match correlate(request, &buffer).ensure_matched() {
                    Ok(()) => {
                        debug!(
                            description,
                            request = %frame.to_hex(),
                            response = %to_hex(&buffer),
                            "Exchange ok"
                        );
                        ExchangeResult::succeeded(description, request, buffer)
                    }
                    Err(e) => {
                        warn!(
                            description,
                            error = %e,
                            response = %to_hex(&buffer),
                            "Response failed validation"
                        );
                        self.stats().record_validation_failure();
                        ExchangeResult::rejected(description, request, buffer)
                    }
                }
            }
            Err(e) => {
                warn!(description, error = %e, "Exchange failed, resetting connection");
                self.stats().record_transport_error();
                link.close().await;
                ExchangeResult::failed(
                    description,
                    request,
                    format!("{description} → communication error: {e}"),
                )
            }
        }
    }

    /// Probes the link once.
    ///
    /// Failures are logged and tear the connection down so the next caller
    /// reconnects; they are never returned as errors.
    pub async fn heartbeat(&self) -> HeartbeatOutcome {
        let options = self.manager.options();

        if options.skip_heartbeat_when_active && self.active_within(options.heartbeat_interval) {
            debug!("Heartbeat skipped, link recently active");
            return HeartbeatOutcome::Skipped;
        }

        let mut link = self.manager.lock().await;

        if !link.ensure_connected().await {
            warn!(endpoint = %link.endpoint(), "Heartbeat: link unavailable");
            return HeartbeatOutcome::Unreachable;
        }

        let mut buffer = vec![0u8; options.recv_buffer_size];
        let outcome = match link.connection() {
            Ok(connection) => self.round_trip(connection, &HEARTBEAT_PROBE, &mut buffer).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(len) if len > 0 => {
                debug!(len, "Heartbeat ok");
                self.stats().record_heartbeat(true);
                HeartbeatOutcome::Healthy
            }
            Ok(_) | Err(Error::ConnectionClosed) => {
                warn!("Heartbeat got no response, resetting connection");
                self.stats().record_heartbeat(false);
                link.close().await;
                HeartbeatOutcome::Failed
            }
            Err(e) => {
                warn!(error = %e, "Heartbeat failed, resetting connection");
                self.stats().record_heartbeat(false);
                link.close().await;
                HeartbeatOutcome::Failed
            }
        }
    }

    /// Writes `request` and reads one chunk into `buffer`.
    async fn round_trip(
        &self,
        connection: &mut Connection,
        request: &[u8],
        buffer: &mut [u8],
    ) -> Result<usize> {
        let stale = connection.discard_unread()?;
        if stale > 0 {
            debug!(id = %connection.id(), stale, "Dropped stale bytes before request");
        }

        connection.send(request).await?;
        self.stats().record_sent();

        connection.receive(buffer).await
    }

    /// Returns `true` if a real exchange got a response within `window`.
    fn active_within(&self, window: std::time::Duration) -> bool {
        let last = *self.last_activity.lock();
        last.is_some_and(|at| at.elapsed() < window)
    }
}

// ============================================================================
// Tests
// ============================================================================
