//! Link configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Endpoint`] | Validated `{host, port}` of the device |
//! | [`LinkOptions`] | Timeouts, heartbeat cadence, buffer size |
//!
//! Configuration lives in memory only. A restarted process starts again
//! from [`Endpoint::default`] unless the embedding application supplies
//! something else.

// ============================================================================
// Submodules
// ============================================================================

/// Device address.
pub mod endpoint;

/// Timing and buffer options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use endpoint::Endpoint;
pub use options::LinkOptions;
