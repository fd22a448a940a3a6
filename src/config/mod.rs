//! Connection configuration.
//!
//! Platform-independent, host-testable types describing the network to join
//! and the retry policy used while joining it.
//!
//! Credentials are passed in explicitly (constructor or environment) and are
//! never written anywhere by this crate.

mod wifi;

pub use wifi::{
    env, AuthMode, ConfigError, ConnectionConfig, CountryCode, DEFAULT_BACKOFF_BASE_MS,
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_COUNTRY, DEFAULT_MAX_BACKOFF_MS, DEFAULT_MAX_RETRIES,
    MAX_PASSWORD_LEN, MAX_SSID_LEN, MIN_PASSWORD_LEN,
};
