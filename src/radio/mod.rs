//! Radio driver abstraction.
//!
//! The connection manager never talks to hardware directly. It drives an
//! implementation of [`RadioDriver`], which may be:
//! - **ESP32** (`esp32` feature): [`EspRadio`], a wrapper around ESP-IDF WiFi
//! - **Host**: [`ScriptedRadio`], which replays scripted join outcomes
//!
//! Drivers are treated as an external singleton: the manager borrows the
//! driver mutably for each call and never calls it reentrantly.

use crate::config::{AuthMode, CountryCode};
use std::time::Duration;

#[cfg(feature = "esp32")]
mod esp;
pub mod join;
mod scripted;

#[cfg(feature = "esp32")]
pub use esp::EspRadio;
pub use scripted::{ScriptedRadio, SIMULATE_ENV};

/// Vendor radio driver used by the connection manager.
#[allow(async_fn_in_trait)]
pub trait RadioDriver {
    /// Bring up the radio for the given regulatory domain.
    async fn init(&mut self, country: CountryCode) -> Result<(), RadioError>;

    /// Switch the radio into station (client) mode.
    async fn enable_station_mode(&mut self) -> Result<(), RadioError>;

    /// Join a network, giving up after `timeout`.
    async fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        auth_mode: AuthMode,
        timeout: Duration,
    ) -> Result<(), JoinError>;

    /// Leave the current network.
    async fn disconnect(&mut self);
}

/// Outcome of a single failed join attempt, as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(not(target_os = "espidf"), derive(serde::Serialize))]
pub enum JoinError {
    /// The attempt did not complete within the timeout.
    Timeout,
    /// The access point rejected the credentials.
    AuthRejected,
    /// No access point with the SSID was found.
    NoNetwork,
    /// Any other driver failure.
    Failed,
}

impl JoinError {
    /// Whether a later attempt may succeed without changing the configuration.
    ///
    /// Rejected credentials stay rejected; everything else may be a weak
    /// signal or a busy access point.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::AuthRejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::AuthRejected => "auth-rejected",
            Self::NoNetwork => "no-network",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "join timed out"),
            Self::AuthRejected => write!(f, "credentials rejected"),
            Self::NoNetwork => write!(f, "network not found"),
            Self::Failed => write!(f, "join failed"),
        }
    }
}

impl std::error::Error for JoinError {}

/// Radio bring-up failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioError {
    reason: String,
}

impl RadioError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl std::fmt::Display for RadioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "radio error: {}", self.reason)
    }
}

impl std::error::Error for RadioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_rejection_is_permanent() {
        assert!(JoinError::Timeout.is_transient());
        assert!(JoinError::NoNetwork.is_transient());
        assert!(JoinError::Failed.is_transient());
        assert!(!JoinError::AuthRejected.is_transient());
    }

    #[test]
    fn test_radio_error_display() {
        let err = RadioError::new("chip not responding");
        assert_eq!(err.reason(), "chip not responding");
        assert_eq!(err.to_string(), "radio error: chip not responding");
    }
}
