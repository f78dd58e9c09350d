//! Structured outcome of one exchange.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::frame::to_hex;

// ============================================================================
// Constants
// ============================================================================

/// Message used when the link could not be brought up.
pub const NOT_CONNECTED: &str = "not connected";

/// Message used when the response does not belong to the request.
pub const VALIDATION_FAILED: &str = "validation failed";

/// Message used when an empty frame is submitted.
pub const EMPTY_FRAME: &str = "empty frame";

// ============================================================================
// ExchangeResult
// ============================================================================

/// Result of one request/response exchange.
///
/// Immutable once built. Serializes as
///
/// ```json
/// {
///   "success": true,
///   "message": "read meter → success",
///   "description": "read meter",
///   "requestHex": "00 01 00 00 00 06 01 03 00 00 00 01",
///   "responseHex": "00 01 00 00 00 05 01 03 02 12 34"
/// }
/// ```
///
/// `responseHex` is `null` when no bytes came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResult {
    success: bool,
    message: String,
    description: String,
    request_hex: String,
    response_hex: Option<String>,
    #[serde(skip)]
    response: Option<Vec<u8>>,
}

impl ExchangeResult {
    /// Builds a successful result.
    pub(crate) fn succeeded(description: &str, request: &[u8], response: Vec<u8>) -> Self {
        Self {
            success: true,
            message: format!("{description} → success"),
            description: description.to_string(),
            request_hex: to_hex(request),
            response_hex: Some(to_hex(&response)),
            response: Some(response),
        }
    }

    /// Builds a failed result that still carries the response bytes.
    pub(crate) fn rejected(description: &str, request: &[u8], response: Vec<u8>) -> Self {
        Self {
            success: false,
            message: VALIDATION_FAILED.to_string(),
            description: description.to_string(),
            request_hex: to_hex(request),
            response_hex: Some(to_hex(&response)),
            response: Some(response),
        }
    }

    /// Builds a failed result with no response.
    pub(crate) fn failed(description: &str, request: &[u8], message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            description: description.to_string(),
            request_hex: to_hex(request),
            response_hex: None,
            response: None,
        }
    }

    /// Returns `true` if a correlated response arrived.
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the human-readable outcome.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the caller-supplied description.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the request as spaced uppercase hex.
    #[inline]
    #[must_use]
    pub fn request_hex(&self) -> &str {
        &self.request_hex
    }

    /// Returns the response as spaced uppercase hex, if any bytes arrived.
    #[inline]
    #[must_use]
    pub fn response_hex(&self) -> Option<&str> {
        self.response_hex.as_deref()
    }

    /// Returns the raw response bytes, if any arrived.
    #[inline]
    #[must_use]
    pub fn response(&self) -> Option<&[u8]> {
        self.response.as_deref()
    }
}

// ============================================================================
// Tests
// ============================================================================
