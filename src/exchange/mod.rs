//! Request/response exchanges and link upkeep.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `engine` | Serialized exchange and single heartbeat probe |
//! | `heartbeat` | Periodic task driving the probe |
//! | `result` | [`ExchangeResult`] reported to callers |

// ============================================================================
// Submodules
// ============================================================================

/// Serialized exchange engine.
pub mod engine;

/// Periodic heartbeat task.
pub mod heartbeat;

/// Exchange result type.
pub mod result;

// ============================================================================
// Re-exports
// ============================================================================

pub use engine::{ExchangeEngine, HEARTBEAT_PROBE, HeartbeatOutcome};
pub use heartbeat::{Heartbeat, HeartbeatHandle};
pub use result::ExchangeResult;
