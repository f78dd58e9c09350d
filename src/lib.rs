//! Modbus Link - persistent request/response client for Modbus-TCP devices.
//!
//! This library keeps one long-lived TCP connection to an industrial device
//! and funnels every caller's request through it, one exchange at a time.
//!
//! # Architecture
//!
//! ```text
//! callers ──► ModbusLink ──► ExchangeEngine ──► ConnectionManager ──► TCP ──► device
//!                 │                 ▲
//!                 └── Heartbeat ────┘
//! ```
//!
//! Key design principles:
//!
//! - One [`ConnectionManager`] owns at most one socket; no process-wide state
//! - Every exchange holds the manager lock from connect check to response
//! - Frames are opaque; only the transaction id (bytes 0-1) and function
//!   code (byte 7) are checked
//! - Failures become values: exchanges return [`ExchangeResult`], never errors
//! - A dead socket is torn down on the spot; the next caller reconnects
//!
//! # Quick Start
//!
//! ```no_run
//! use modbus_link::{ModbusLink, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let link = ModbusLink::builder().host("192.168.1.35").port(502).build()?;
//!     link.start().await;
//!
//!     // Read one holding register at address 0 from unit 1.
//!     let frame = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x01];
//!     let result = link.exchange(frame, "read register 0").await;
//!     println!("{}: {:?}", result.message(), result.response_hex());
//!
//!     link.update_endpoint("192.168.1.36", 502).await?;
//!     println!("{:?}", link.connection_status().await);
//!
//!     link.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | [`Endpoint`] and [`LinkOptions`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`exchange`] | Exchange engine, heartbeat, [`ExchangeResult`] |
//! | [`frame`] | Opaque frames, correlation, hex rendering |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`link`] | [`ModbusLink`] facade and builder |
//! | [`stats`] | Link counters |
//! | [`transport`] | TCP connection and its manager |

// ============================================================================
// Modules
// ============================================================================

/// Endpoint and option types.
pub mod config;

/// Error types and result aliases.
///
/// Only configuration-facing operations return [`Result<T>`].
pub mod error;

/// Exchange engine and heartbeat.
pub mod exchange;

/// Opaque frames and response correlation.
pub mod frame;

/// Type-safe identifiers.
pub mod identifiers;

/// Link facade.
///
/// Use [`ModbusLink::builder()`] to create a configured link.
pub mod link;

/// Link counters.
pub mod stats;

/// TCP transport layer.
///
/// Owns the socket and the endpoint it points at.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration types
pub use config::{Endpoint, LinkOptions};

// Error types
pub use error::{Error, Result};

// Exchange types
pub use exchange::{ExchangeEngine, ExchangeResult, HeartbeatHandle, HeartbeatOutcome};

// Frame types
pub use frame::{Correlation, Frame};

// Identifier types
pub use identifiers::ConnectionId;

// Link types
pub use link::{LinkBuilder, ModbusLink};

// Statistics types
pub use stats::{LinkStats, StatsSnapshot};

// Transport types
pub use transport::{ConnectionManager, ConnectionStatus};
