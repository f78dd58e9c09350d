//! Builder pattern for link configuration.
//!
//! Provides a fluent API for configuring and creating [`ModbusLink`]
//! instances.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use modbus_link::ModbusLink;
//!
//! # fn example() -> modbus_link::Result<()> {
//! let link = ModbusLink::builder()
//!     .host("10.0.0.7")
//!     .port(1502)
//!     .read_timeout(Duration::from_secs(3))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::config::endpoint::{DEFAULT_HOST, DEFAULT_PORT};
use crate::config::{Endpoint, LinkOptions};
use crate::error::Result;

use super::core::ModbusLink;

// ============================================================================
// LinkBuilder
// ============================================================================

/// Builder for configuring a [`ModbusLink`].
///
/// Use [`ModbusLink::builder()`] to create a new builder. Unset host and
/// port fall back to `192.168.1.35:502`.
#[derive(Debug, Default, Clone)]
pub struct LinkBuilder {
    /// Device host.
    host: Option<String>,
    /// Device port, validated on build.
    port: Option<i64>,
    /// Timing and buffer options.
    options: LinkOptions,
}

// ============================================================================
// LinkBuilder Implementation
// ============================================================================

impl LinkBuilder {
    /// Creates a builder with default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the device host name or address.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the device port.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: i64) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets host and port from an existing endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: &Endpoint) -> Self {
        self.host = Some(endpoint.host().to_string());
        self.port = Some(i64::from(endpoint.port()));
        self
    }

    /// Replaces all timing and buffer options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: LinkOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[inline]
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.options.read_timeout = timeout;
        self
    }

    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.options.heartbeat_interval = interval;
        self
    }

    /// Enables or disables the periodic heartbeat.
    #[inline]
    #[must_use]
    pub fn heartbeat(mut self, enabled: bool) -> Self {
        self.options.heartbeat_enabled = enabled;
        self
    }

    /// Skips heartbeats while real exchanges keep the link busy.
    #[inline]
    #[must_use]
    pub fn skip_heartbeat_when_active(mut self, skip: bool) -> Self {
        self.options.skip_heartbeat_when_active = skip;
        self
    }

    /// Sets the receive buffer size.
    #[inline]
    #[must_use]
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.options.recv_buffer_size = size;
        self
    }

    /// Builds the link with validation. Does not connect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the endpoint or any
    /// option is invalid.
    pub fn build(self) -> Result<ModbusLink> {
        let endpoint = Endpoint::new(
            self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            self.port.unwrap_or(i64::from(DEFAULT_PORT)),
        )?;

        ModbusLink::new(endpoint, self.options)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_default_builder() {
        let builder = LinkBuilder::new();
        assert!(builder.host.is_none());
        assert!(builder.port.is_none());
        assert_eq!(builder.options, LinkOptions::default());
    }

    #[test]
    fn test_setters() {
        let builder = LinkBuilder::new()
            .host("plc")
            .port(1502)
            .connect_timeout(Duration::from_secs(1))
            .read_timeout(Duration::from_secs(2))
            .heartbeat_interval(Duration::from_secs(30))
            .heartbeat(false)
            .skip_heartbeat_when_active(true)
            .recv_buffer_size(300);

        assert_eq!(builder.host.as_deref(), Some("plc"));
        assert_eq!(builder.port, Some(1502));
        assert_eq!(builder.options.connect_timeout, Duration::from_secs(1));
        assert_eq!(builder.options.read_timeout, Duration::from_secs(2));
        assert_eq!(builder.options.heartbeat_interval, Duration::from_secs(30));
        assert!(!builder.options.heartbeat_enabled);
        assert!(builder.options.skip_heartbeat_when_active);
        assert_eq!(builder.options.recv_buffer_size, 300);
    }

    #[test]
    fn test_endpoint_sets_host_and_port() {
        let endpoint = Endpoint::new("10.1.1.1", 503).unwrap();
        let builder = LinkBuilder::new().endpoint(&endpoint);
        assert_eq!(builder.host.as_deref(), Some("10.1.1.1"));
        assert_eq!(builder.port, Some(503));
    }

    #[test]
    fn test_build_fails_with_bad_port() {
        let err = LinkBuilder::new().port(0).build().unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_build_fails_with_blank_host() {
        assert!(LinkBuilder::new().host(" ").build().is_err());
    }

    #[test]
    fn test_build_fails_with_bad_options() {
        assert!(LinkBuilder::new().recv_buffer_size(4).build().is_err());
        assert!(LinkBuilder::new().read_timeout(Duration::ZERO).build().is_err());
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = LinkBuilder::new().host("plc");
        let cloned = builder.clone();
        assert_eq!(builder.host, cloned.host);
    }
}
