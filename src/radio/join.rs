//! Join bookkeeping for station drivers.
//!
//! On ESP-IDF the reason a join failed arrives as a station-disconnected
//! event on the system event loop, not as the return value of the connect
//! call. [`DisconnectLog`] carries the latest reason code from the event
//! handler back to the joining task, and [`error_for_disconnect`] turns it
//! into a [`JoinError`]. [`JoinDeadline`] splits one join timeout across
//! association and DHCP.

use super::JoinError;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Station disconnect reason codes (`wifi_err_reason_t`).
pub mod reason {
    pub const FOUR_WAY_HANDSHAKE_TIMEOUT: u16 = 15;
    pub const BEACON_TIMEOUT: u16 = 200;
    pub const NO_AP_FOUND: u16 = 201;
    pub const AUTH_FAIL: u16 = 202;
    pub const ASSOC_FAIL: u16 = 203;
    pub const HANDSHAKE_TIMEOUT: u16 = 204;
    pub const CONNECTION_FAIL: u16 = 205;
    pub const NO_AP_FOUND_W_COMPATIBLE_SECURITY: u16 = 210;
    pub const NO_AP_FOUND_IN_AUTHMODE_THRESHOLD: u16 = 211;
    pub const NO_AP_FOUND_IN_RSSI_THRESHOLD: u16 = 212;
}

/// Classify a station disconnect reason.
///
/// A failed key handshake is how a wrong passphrase shows up, so it counts
/// as rejected credentials.
pub fn error_for_disconnect(code: u16) -> JoinError {
    match code {
        reason::AUTH_FAIL | reason::FOUR_WAY_HANDSHAKE_TIMEOUT | reason::HANDSHAKE_TIMEOUT => {
            JoinError::AuthRejected
        }
        reason::NO_AP_FOUND
        | reason::NO_AP_FOUND_W_COMPATIBLE_SECURITY
        | reason::NO_AP_FOUND_IN_AUTHMODE_THRESHOLD
        | reason::NO_AP_FOUND_IN_RSSI_THRESHOLD => JoinError::NoNetwork,
        reason::BEACON_TIMEOUT => JoinError::Timeout,
        _ => JoinError::Failed,
    }
}

/// Latest station disconnect reason, shared with an event handler.
///
/// Code 0 is not a valid reason and means "nothing recorded".
#[derive(Debug, Clone, Default)]
pub struct DisconnectLog {
    last: Arc<AtomicU16>,
}

impl DisconnectLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, code: u16) {
        self.last.store(code, Ordering::Release);
    }

    pub fn clear(&self) {
        self.last.store(0, Ordering::Release);
    }

    pub fn last(&self) -> Option<u16> {
        match self.last.load(Ordering::Acquire) {
            0 => None,
            code => Some(code),
        }
    }
}

/// Fixed point in time by which a join must have finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinDeadline {
    at: Instant,
}

impl JoinDeadline {
    pub fn after(timeout: Duration) -> Self {
        Self::starting_at(Instant::now(), timeout)
    }

    pub fn starting_at(start: Instant, timeout: Duration) -> Self {
        Self {
            at: start.checked_add(timeout).unwrap_or(start),
        }
    }

    /// Time left, zero once the deadline has passed.
    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.at.saturating_duration_since(now)
    }
}
