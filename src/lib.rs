//! WiFi station bring-up for microcontroller boards.
//!
//! This library contains the connection lifecycle (initialize, join with
//! retry and backoff, disconnect) as platform-independent components that can
//! be tested on the host machine without radio hardware.

pub mod config;
pub mod radio;
pub mod report;
pub mod wifi;

// Re-export commonly used items
pub use config::{AuthMode, ConfigError, ConnectionConfig, CountryCode};
pub use radio::{JoinError, RadioDriver, RadioError, ScriptedRadio};
pub use wifi::{
    ConnectError, ConnectionManager, ConnectionPhase, ConnectionState, DisconnectError,
    FailureReason, InitError, StateWatcher,
};

#[cfg(feature = "esp32")]
pub use radio::EspRadio;
