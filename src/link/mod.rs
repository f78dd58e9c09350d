//! Link entry point.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ModbusLink`] | Handle owning manager, engine and heartbeat |
//! | [`LinkBuilder`] | Fluent configuration builder |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for link configuration.
pub mod builder;

/// Core link implementation.
pub mod core;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::LinkBuilder;
pub use core::ModbusLink;
