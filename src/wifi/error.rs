//! Errors returned by the connection manager.

use std::fmt;

/// Radio bring-up failed. Terminal: the manager never retries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(not(target_os = "espidf"), derive(serde::Serialize))]
pub enum InitError {
    /// The driver reported a failure during `init` or station mode setup.
    HardwareUnavailable,
}

impl InitError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HardwareUnavailable => "hardware-unavailable",
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareUnavailable => write!(f, "radio hardware unavailable"),
        }
    }
}

impl std::error::Error for InitError {}

/// Joining the network failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(not(target_os = "espidf"), derive(serde::Serialize))]
pub enum ConnectError {
    /// The last permitted attempt did not return within the attempt deadline.
    Timeout,
    /// The access point rejected the credentials.
    AuthRejected,
    /// Every permitted attempt failed.
    RetriesExhausted,
    /// The caller cancelled the connect loop.
    Cancelled,
    /// `connect()` was called before a successful `initialize()`.
    NotInitialized,
}

impl ConnectError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::AuthRejected => "auth-rejected",
            Self::RetriesExhausted => "retries-exhausted",
            Self::Cancelled => "cancelled",
            Self::NotInitialized => "not-initialized",
        }
    }
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "connection attempt timed out"),
            Self::AuthRejected => write!(f, "credentials rejected by access point"),
            Self::RetriesExhausted => write!(f, "all connection attempts failed"),
            Self::Cancelled => write!(f, "connection cancelled"),
            Self::NotInitialized => write!(f, "radio not initialized"),
        }
    }
}

impl std::error::Error for ConnectError {}

/// Disconnecting cannot currently fail; reserved for drivers that can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectError {}

impl fmt::Display for DisconnectError {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl std::error::Error for DisconnectError {}
