//! Remote device address.
//!
//! # Example
//!
//! ```
//! use modbus_link::Endpoint;
//!
//! let endpoint = Endpoint::new("192.168.1.35", 502).unwrap();
//! assert_eq!(endpoint.to_string(), "192.168.1.35:502");
//!
//! assert!(Endpoint::new("", 502).is_err());
//! assert!(Endpoint::new("plc", 0).is_err());
//! assert!(Endpoint::new("plc", 65536).is_err());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Host used when nothing else is configured.
pub const DEFAULT_HOST: &str = "192.168.1.35";

/// Standard Modbus-TCP port.
pub const DEFAULT_PORT: u16 = 502;

// ============================================================================
// Endpoint
// ============================================================================

/// `{host, port}` of the remote device.
///
/// Always valid once constructed: host is non-blank and port is in
/// `1..=65535`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEndpoint")]
pub struct Endpoint {
    host: String,
    port: u16,
}

/// Unvalidated wire shape, checked on deserialization.
#[derive(Deserialize)]
struct RawEndpoint {
    host: String,
    port: i64,
}

impl TryFrom<RawEndpoint> for Endpoint {
    type Error = Error;

    fn try_from(raw: RawEndpoint) -> Result<Self> {
        Self::new(raw.host, raw.port)
    }
}

impl Endpoint {
    /// Creates a validated endpoint.
    ///
    /// `port` is taken as a wide integer so out-of-range caller input is
    /// rejected here rather than truncated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is blank or the port is outside
    /// `1..=65535`.
    pub fn new(host: impl Into<String>, port: i64) -> Result<Self> {
        let host = host.into();
        let trimmed = host.trim();
        if trimmed.is_empty() {
            return Err(Error::config("host must not be empty"));
        }

        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| Error::config(format!("port out of range 1-65535: {port}")))?;

        Ok(Self {
            host: trimmed.to_string(),
            port,
        })
    }

    /// Returns the host name or address.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the TCP port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    /// Parses `host:port` or `[ipv6]:port`.
    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::config(format!("expected host:port, got {s:?}")))?;

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        let port: i64 = port
            .trim()
            .parse()
            .map_err(|_| Error::config(format!("invalid port in {s:?}")))?;

        Self::new(host, port)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_default() {
        let endpoint = Endpoint::default();
        assert_eq!(endpoint.host(), "192.168.1.35");
        assert_eq!(endpoint.port(), 502);
    }

    #[test]
    fn test_rejects_invalid_ports() {
        for port in [0, 65536, -1, i64::MIN, i64::MAX] {
            let err = Endpoint::new("plc", port).unwrap_err();
            assert!(matches!(err, Error::Config { .. }), "port {port}");
        }
    }

    #[test]
    fn test_rejects_blank_host() {
        assert!(Endpoint::new("", 502).is_err());
        assert!(Endpoint::new("   ", 502).is_err());
    }

    #[test]
    fn test_trims_host() {
        let endpoint = Endpoint::new("  plc.local ", 1502).unwrap();
        assert_eq!(endpoint.host(), "plc.local");
    }

    #[test]
    fn test_boundary_ports() {
        assert_eq!(Endpoint::new("h", 1).unwrap().port(), 1);
        assert_eq!(Endpoint::new("h", 65535).unwrap().port(), 65535);
    }

    #[test]
    fn test_display_and_parse() {
        let endpoint: Endpoint = "10.0.0.7:502".parse().unwrap();
        assert_eq!(endpoint, Endpoint::new("10.0.0.7", 502).unwrap());
        assert_eq!(endpoint.to_string(), "10.0.0.7:502");

        let v6: Endpoint = "[::1]:1502".parse().unwrap();
        assert_eq!(v6.host(), "::1");
        assert_eq!(v6.to_string(), "[::1]:1502");
    }

    #[test]
    fn test_parse_errors() {
        assert!("no-port".parse::<Endpoint>().is_err());
        assert!("host:abc".parse::<Endpoint>().is_err());
        assert!("host:70000".parse::<Endpoint>().is_err());
        assert!(":502".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Endpoint = serde_json::from_str(r#"{"host":"plc","port":502}"#).unwrap();
        assert_eq!(ok.port(), 502);

        assert!(serde_json::from_str::<Endpoint>(r#"{"host":"plc","port":0}"#).is_err());
        assert!(serde_json::from_str::<Endpoint>(r#"{"host":"","port":502}"#).is_err());
    }

    proptest! {
        #[test]
        fn prop_valid_range_accepted(host in "[a-z][a-z0-9.-]{0,20}", port in 1i64..=65535) {
            let endpoint = Endpoint::new(host.clone(), port).unwrap();
            prop_assert_eq!(endpoint.host(), host.as_str());
            prop_assert_eq!(i64::from(endpoint.port()), port);
        }

        #[test]
        fn prop_out_of_range_rejected(port in prop_oneof![i64::MIN..=0, 65536i64..=i64::MAX]) {
            prop_assert!(Endpoint::new("plc", port).is_err());
        }
    }
}
