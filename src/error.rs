//! Error types for the Modbus link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Only configuration-facing operations return [`Result<T>`]. The exchange
//! path converts every failure into a value ([`ExchangeResult`] or `bool`)
//! before it reaches the caller:
//!
//! ```ignore
//! use modbus_link::{ModbusLink, Result};
//!
//! async fn reconfigure(link: &ModbusLink) -> Result<()> {
//!     link.update_endpoint("10.0.0.7", 502).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection state | [`Error::NotConnected`] |
//! | Transport | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::Io`] |
//! | Protocol | [`Error::Validation`] |
//!
//! [`ExchangeResult`]: crate::exchange::ExchangeResult

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when an endpoint or link option is invalid. The link state
    /// is left untouched.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection State Errors
    // ========================================================================
    /// No live connection is installed.
    ///
    /// Returned when the socket is requested while the link is down.
    #[error("not connected")]
    NotConnected,

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// TCP connection failed.
    ///
    /// Returned when the device refuses the connection or the host cannot
    /// be resolved.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connect attempt did not complete in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The device closed the connection while a response was awaited.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Response received but it does not belong to the request.
    ///
    /// This is a soft failure: the connection stays usable.
    #[error("Validation failed: {reason}")]
    Validation {
        /// Which positional check failed.
        reason: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a validation error.
    #[inline]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::ConnectionTimeout { .. } => true,
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    /// Returns `true` if this error means the socket is no longer usable.
    ///
    /// Transport errors always tear the connection down.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::Io(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
