//! Link timing and buffer options.
//!
//! Provides a type-safe interface for the knobs that bound every blocking
//! operation on the link.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use modbus_link::LinkOptions;
//!
//! let options = LinkOptions::new()
//!     .with_connect_timeout(Duration::from_secs(2))
//!     .with_read_timeout(Duration::from_secs(3))
//!     .with_heartbeat_interval(Duration::from_secs(15));
//!
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::frame::MIN_RESPONSE_LEN;

// ============================================================================
// Constants
// ============================================================================

/// Default bound on a TCP connect, DNS included.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default bound on waiting for a response.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Default delay between heartbeat probes.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Maximum Modbus-TCP ADU size.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 260;

// ============================================================================
// LinkOptions
// ============================================================================

/// Link configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOptions {
    /// Upper bound for one connect attempt.
    pub connect_timeout: Duration,

    /// Upper bound for one response read.
    pub read_timeout: Duration,

    /// Delay between heartbeat probes.
    pub heartbeat_interval: Duration,

    /// Receive buffer size; one read never returns more than this.
    pub recv_buffer_size: usize,

    /// Skip the heartbeat probe when a real exchange completed within the
    /// last interval.
    pub skip_heartbeat_when_active: bool,

    /// Run the periodic heartbeat task.
    pub heartbeat_enabled: bool,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl LinkOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            skip_heartbeat_when_active: false,
            heartbeat_enabled: true,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl LinkOptions {
    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[inline]
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the receive buffer size.
    #[inline]
    #[must_use]
    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Enables skipping heartbeats while real traffic keeps the link busy.
    #[inline]
    #[must_use]
    pub fn with_skip_heartbeat_when_active(mut self, skip: bool) -> Self {
        self.skip_heartbeat_when_active = skip;
        self
    }

    /// Enables or disables the periodic heartbeat task.
    #[inline]
    #[must_use]
    pub fn with_heartbeat(mut self, enabled: bool) -> Self {
        self.heartbeat_enabled = enabled;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl LinkOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a timeout or interval is zero, or the
    /// receive buffer cannot hold a minimal response.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect timeout must be greater than zero"));
        }
        if self.read_timeout.is_zero() {
            return Err(Error::config("read timeout must be greater than zero"));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(Error::config("heartbeat interval must be greater than zero"));
        }
        if self.recv_buffer_size < MIN_RESPONSE_LEN {
            return Err(Error::config(format!(
                "receive buffer must hold at least {MIN_RESPONSE_LEN} bytes, got {}",
                self.recv_buffer_size
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
