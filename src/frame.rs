//! Opaque request frames and response correlation.
//!
//! The link never interprets register payloads. It only relies on a
//! positional contract shared by every Modbus-TCP frame:
//!
//! | Offset | Meaning |
//! |--------|---------|
//! | 0..2 | Transaction id (correlation token) |
//! | 7 | Function code (operation token) |
//!
//! A response belongs to a request when it is at least
//! [`MIN_RESPONSE_LEN`] bytes long and both tokens match.

// ============================================================================
// Imports
// ============================================================================

use std::fmt::{self, Write as _};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Shortest response that can carry both correlation tokens.
pub const MIN_RESPONSE_LEN: usize = 8;

/// Offset of the function code token.
const FUNCTION_CODE_OFFSET: usize = 7;

// ============================================================================
// Frame
// ============================================================================

/// One protocol request as raw bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Frame(Vec<u8>);

impl Frame {
    /// Wraps raw request bytes.
    #[inline]
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the frame length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the frame has no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the transaction id token, if present.
    #[inline]
    #[must_use]
    pub fn transaction_id(&self) -> Option<[u8; 2]> {
        transaction_id(&self.0)
    }

    /// Returns the function code token, if present.
    #[inline]
    #[must_use]
    pub fn function_code(&self) -> Option<u8> {
        self.0.get(FUNCTION_CODE_OFFSET).copied()
    }

    /// Renders the frame as spaced uppercase hex.
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame[{}]", to_hex(&self.0))
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Frame {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Frame {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Frame {
    fn from(bytes: &[u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================================================
// Correlation
// ============================================================================

/// Outcome of matching a response against its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// All positional checks hold.
    Matched,
    /// Response shorter than [`MIN_RESPONSE_LEN`].
    TooShort {
        /// Bytes actually received.
        len: usize,
    },
    /// Transaction id differs (or the request has none).
    TransactionMismatch,
    /// Function code differs (or the request has none).
    FunctionMismatch,
}

impl Correlation {
    /// Returns `true` for [`Correlation::Matched`].
    #[inline]
    #[must_use]
    pub const fn is_matched(self) -> bool {
        matches!(self, Self::Matched)
    }

    /// Turns a mismatch into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the failed check unless the
    /// response matched.
    pub fn ensure_matched(self) -> Result<()> {
        if self.is_matched() {
            Ok(())
        } else {
            Err(Error::validation(self.to_string()))
        }
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched => f.write_str("matched"),
            Self::TooShort { len } => {
                write!(f, "response too short: {len} < {MIN_RESPONSE_LEN} bytes")
            }
            Self::TransactionMismatch => f.write_str("transaction id mismatch"),
            Self::FunctionMismatch => f.write_str("function code mismatch"),
        }
    }
}

/// Checks that `response` answers `request`.
#[must_use]
pub fn correlate(request: &[u8], response: &[u8]) -> Correlation {
    if response.len() < MIN_RESPONSE_LEN {
        return Correlation::TooShort {
            len: response.len(),
        };
    }

    match (transaction_id(request), transaction_id(response)) {
        (Some(sent), Some(received)) if sent == received => {}
        _ => return Correlation::TransactionMismatch,
    }

    match request.get(FUNCTION_CODE_OFFSET) {
        Some(code) if *code == response[FUNCTION_CODE_OFFSET] => Correlation::Matched,
        _ => Correlation::FunctionMismatch,
    }
}

#[inline]
fn transaction_id(bytes: &[u8]) -> Option<[u8; 2]> {
    match bytes {
        [hi, lo, ..] => Some([*hi, *lo]),
        _ => None,
    }
}

// ============================================================================
// Hex Rendering
// ============================================================================

/// Renders bytes as two-digit uppercase hex separated by single spaces.
///
/// `[0x00, 0x1F, 0xAB]` becomes `"00 1F AB"`; an empty slice becomes `""`.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // Writing into a String cannot fail.
        let _ = write!(out, "{byte:02X}");
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
