//! TCP transport layer.
//!
//! This module owns the one physical link to the device.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐                       ┌─────────────────┐
//! │  ConnectionManager  │                       │  Modbus device  │
//! │  (endpoint, lock)   │        TCP            │                 │
//! │  → Connection       │◄─────────────────────►│  :502           │
//! │                     │   request/response    │                 │
//! └─────────────────────┘                       └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `ConnectionManager::connect` - Close any old socket, open a new one
//! 2. `ConnectionManager::lock` - Borrow the live `Connection` for one exchange
//! 3. `LinkGuard::close` - Tear the socket down after an I/O failure
//! 4. `ConnectionManager::update_endpoint` - Close, repoint, reconnect
//! 5. `ConnectionManager::shutdown` - Close at process teardown
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | One TCP stream with timeouts and liveness probing |
//! | `manager` | Endpoint configuration and connection lifecycle |

// ============================================================================
// Submodules
// ============================================================================

/// One TCP stream with timeouts.
pub mod connection;

/// Endpoint configuration and connection lifecycle.
pub mod manager;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use manager::{ConnectionManager, ConnectionStatus, LinkGuard};
