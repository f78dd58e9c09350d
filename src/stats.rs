//! Link statistics.
//!
//! Counters are plain atomics shared between the connection manager and the
//! exchange engine; [`LinkStats::snapshot`] copies them for reporting.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// ============================================================================
// LinkStats
// ============================================================================

/// Live counters for one link.
#[derive(Debug, Default)]
pub struct LinkStats {
    connects: AtomicU64,
    connect_failures: AtomicU64,
    frames_sent: AtomicU64,
    responses_received: AtomicU64,
    no_responses: AtomicU64,
    validation_failures: AtomicU64,
    transport_errors: AtomicU64,
    heartbeats_ok: AtomicU64,
    heartbeats_failed: AtomicU64,
}

/// Point-in-time copy of [`LinkStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Successful TCP connects.
    pub connects: u64,
    /// Failed TCP connect attempts.
    pub connect_failures: u64,
    /// Frames fully written to the socket.
    pub frames_sent: u64,
    /// Non-empty responses read.
    pub responses_received: u64,
    /// Reads that ended with no bytes (timeout or end of stream).
    pub no_responses: u64,
    /// Responses that failed correlation.
    pub validation_failures: u64,
    /// Write or read errors.
    pub transport_errors: u64,
    /// Heartbeat probes answered.
    pub heartbeats_ok: u64,
    /// Heartbeat probes that tore the connection down.
    pub heartbeats_failed: u64,
}

impl LinkStats {
    /// Creates zeroed counters.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_connect(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_response(&self) {
        self.responses_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_no_response(&self) {
        self.no_responses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_heartbeat(&self, healthy: bool) {
        if healthy {
            self.heartbeats_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.heartbeats_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Copies all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connects: self.connects.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            responses_received: self.responses_received.load(Ordering::Relaxed),
            no_responses: self.no_responses.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            heartbeats_ok: self.heartbeats_ok.load(Ordering::Relaxed),
            heartbeats_failed: self.heartbeats_failed.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
