//! WiFi connection configuration.
//!
//! Platform-independent, host-testable types describing which network to join
//! and how patiently to try.
//!
//! # Example
//!
//! ```
//! use jartis_wifi::config::{AuthMode, ConnectionConfig};
//!
//! let config = ConnectionConfig::new("MyNetwork", "MyPassword", AuthMode::Wpa2Psk)
//!     .unwrap()
//!     .with_max_retries(5)
//!     .unwrap();
//! assert_eq!(config.max_retries(), 5);
//!
//! let mode: AuthMode = "wpa3".parse().unwrap();
//! assert_eq!(mode, AuthMode::Wpa3Psk);
//! ```

use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA passphrase length.
pub const MAX_PASSWORD_LEN: usize = 63;

/// Minimum WPA passphrase length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Default regulatory domain.
pub const DEFAULT_COUNTRY: &str = "GB";

/// Default per-attempt join timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u32 = 10_000;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff in milliseconds.
pub const DEFAULT_BACKOFF_BASE_MS: u32 = 500;

/// Default cap for exponential backoff in milliseconds.
pub const DEFAULT_MAX_BACKOFF_MS: u32 = 30_000;

/// Environment variable names read by [`ConnectionConfig::from_env`].
pub mod env {
    pub const SSID: &str = "WIFI_SSID";
    pub const PASSWORD: &str = "WIFI_PASSWORD";
    pub const AUTH: &str = "WIFI_AUTH";
    pub const COUNTRY: &str = "WIFI_COUNTRY";
    pub const CONNECT_TIMEOUT_MS: &str = "WIFI_CONNECT_TIMEOUT_MS";
    pub const MAX_RETRIES: &str = "WIFI_MAX_RETRIES";
    pub const BACKOFF_BASE_MS: &str = "WIFI_BACKOFF_BASE_MS";
    pub const MAX_BACKOFF_MS: &str = "WIFI_MAX_BACKOFF_MS";
}

/// Authentication mode of the target network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMode {
    /// No authentication.
    Open,
    /// WPA2 personal (pre-shared key).
    Wpa2Psk,
    /// WPA3 personal (SAE).
    Wpa3Psk,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Wpa2Psk => "wpa2",
            Self::Wpa3Psk => "wpa3",
        }
    }

    /// Whether this mode needs a passphrase.
    pub fn requires_password(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" | "none" => Ok(Self::Open),
            "wpa2" | "wpa2-psk" | "wpa2psk" => Ok(Self::Wpa2Psk),
            "wpa3" | "wpa3-psk" | "wpa3psk" => Ok(Self::Wpa3Psk),
            _ => Err(ConfigError::InvalidValue {
                key: env::AUTH,
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Two-letter ISO 3166 alpha-2 country code, stored upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// Returns the code as a string slice, e.g. `"GB"`.
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("??")
    }

    pub fn as_bytes(&self) -> [u8; 2] {
        self.0
    }
}

impl FromStr for CountryCode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        match bytes {
            [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
                Ok(Self([a.to_ascii_uppercase(), b.to_ascii_uppercase()]))
            }
            _ => Err(ConfigError::InvalidCountryCode(s.to_string())),
        }
    }
}

impl Default for CountryCode {
    fn default() -> Self {
        Self(*b"GB")
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Passphrase that is wiped from memory when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
struct Password(String);

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("\"****\"")
        }
    }
}

/// Immutable description of the network to join and the retry policy.
///
/// Every constructor and `with_*` method validates, so a value of this type
/// is always usable by the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    ssid: String,
    password: Password,
    auth_mode: AuthMode,
    country_code: CountryCode,
    connect_timeout_ms: u32,
    max_retries: u32,
    backoff_base_ms: u32,
    max_backoff_ms: u32,
}

impl ConnectionConfig {
    /// Create a configuration with default timing parameters.
    ///
    /// Returns an error if the SSID, password or auth mode are inconsistent.
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
        auth_mode: AuthMode,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            ssid: ssid.into(),
            password: Password(password.into()),
            auth_mode,
            country_code: CountryCode::default(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration for an open network (no password).
    pub fn open(ssid: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(ssid, String::new(), AuthMode::Open)
    }

    pub fn with_country(mut self, country_code: CountryCode) -> Self {
        self.country_code = country_code;
        self
    }

    pub fn with_connect_timeout_ms(mut self, timeout_ms: u32) -> Result<Self, ConfigError> {
        self.connect_timeout_ms = timeout_ms;
        self.validate()?;
        Ok(self)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Result<Self, ConfigError> {
        self.max_retries = max_retries;
        self.validate()?;
        Ok(self)
    }

    /// Set the backoff base and cap together.
    pub fn with_backoff_ms(mut self, base_ms: u32, max_ms: u32) -> Result<Self, ConfigError> {
        self.backoff_base_ms = base_ms;
        self.max_backoff_ms = max_ms;
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: self.ssid.len(),
                max: MAX_SSID_LEN,
            });
        }

        let password = &self.password.0;
        if password.is_empty() == self.auth_mode.requires_password() {
            return Err(ConfigError::AuthModeMismatch {
                auth_mode: self.auth_mode,
                has_password: !password.is_empty(),
            });
        }
        if !password.is_empty() && password.len() < MIN_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooShort {
                len: password.len(),
                min: MIN_PASSWORD_LEN,
            });
        }
        if password.len() > MAX_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooLong {
                len: password.len(),
                max: MAX_PASSWORD_LEN,
            });
        }

        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.backoff_base_ms == 0 {
            return Err(ConfigError::InvalidBackoff("backoff base must be > 0"));
        }
        if self.max_backoff_ms < self.backoff_base_ms {
            return Err(ConfigError::InvalidBackoff(
                "backoff cap must be >= backoff base",
            ));
        }

        Ok(())
    }

    /// Load a configuration from the process environment.
    ///
    /// See [`env`] for the variable names. Only `WIFI_SSID` is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load a configuration through an arbitrary key lookup.
    ///
    /// `WIFI_AUTH` defaults to `wpa2`, or `open` when the password is empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ssid = lookup(env::SSID)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingVariable(env::SSID))?;
        let password = lookup(env::PASSWORD).unwrap_or_default();

        let auth_mode = match lookup(env::AUTH) {
            Some(value) => value.parse()?,
            None if password.is_empty() => AuthMode::Open,
            None => AuthMode::Wpa2Psk,
        };

        let mut config = Self::new(ssid, password, auth_mode)?;

        if let Some(value) = lookup(env::COUNTRY) {
            config = config.with_country(value.parse()?);
        }
        if let Some(value) = lookup(env::CONNECT_TIMEOUT_MS) {
            let timeout_ms = parse_number(env::CONNECT_TIMEOUT_MS, &value)?;
            config = config.with_connect_timeout_ms(timeout_ms)?;
        }
        if let Some(value) = lookup(env::MAX_RETRIES) {
            config = config.with_max_retries(parse_number(env::MAX_RETRIES, &value)?)?;
        }

        let base = lookup(env::BACKOFF_BASE_MS)
            .map(|v| parse_number(env::BACKOFF_BASE_MS, &v))
            .transpose()?;
        let cap = lookup(env::MAX_BACKOFF_MS)
            .map(|v| parse_number(env::MAX_BACKOFF_MS, &v))
            .transpose()?;
        if base.is_some() || cap.is_some() {
            let base = base.unwrap_or(config.backoff_base_ms);
            let cap = cap.unwrap_or(config.max_backoff_ms);
            config = config.with_backoff_ms(base, cap)?;
        }

        Ok(config)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password.0
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn country_code(&self) -> CountryCode {
        self.country_code
    }

    pub fn connect_timeout_ms(&self) -> u32 {
        self.connect_timeout_ms
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff_base_ms(&self) -> u32 {
        self.backoff_base_ms
    }

    pub fn max_backoff_ms(&self) -> u32 {
        self.max_backoff_ms
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.auth_mode == AuthMode::Open
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

/// Errors that can occur while building a [`ConnectionConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is too short for WPA.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// Password presence does not match the auth mode.
    AuthModeMismatch {
        auth_mode: AuthMode,
        has_password: bool,
    },
    /// Country code is not two ASCII letters.
    InvalidCountryCode(String),
    /// Connect timeout is zero.
    InvalidTimeout,
    /// Backoff parameters are inconsistent.
    InvalidBackoff(&'static str),
    /// An environment value could not be parsed.
    InvalidValue { key: &'static str, value: String },
    /// A required environment variable is not set.
    MissingVariable(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::AuthModeMismatch {
                auth_mode,
                has_password: true,
            } => write!(f, "auth mode {} does not take a password", auth_mode),
            Self::AuthModeMismatch { auth_mode, .. } => {
                write!(f, "auth mode {} requires a password", auth_mode)
            }
            Self::InvalidCountryCode(code) => write!(f, "invalid country code: {:?}", code),
            Self::InvalidTimeout => write!(f, "connect timeout must be > 0"),
            Self::InvalidBackoff(msg) => write!(f, "invalid backoff: {}", msg),
            Self::InvalidValue { key, value } => write!(f, "invalid {}: {:?}", key, value),
            Self::MissingVariable(key) => write!(f, "{} is not set", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_valid_config_uses_defaults() {
        let config = ConnectionConfig::new("Net", "12345678", AuthMode::Wpa2Psk).unwrap();
        assert_eq!(config.ssid(), "Net");
        assert_eq!(config.password(), "12345678");
        assert_eq!(config.country_code().as_str(), DEFAULT_COUNTRY);
        assert_eq!(config.connect_timeout_ms(), DEFAULT_CONNECT_TIMEOUT_MS);
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
        assert_eq!(config.backoff_base_ms(), DEFAULT_BACKOFF_BASE_MS);
        assert_eq!(config.max_backoff_ms(), DEFAULT_MAX_BACKOFF_MS);
    }

    #[test]
    fn test_open_network() {
        let config = ConnectionConfig::open("OpenNetwork").unwrap();
        assert!(config.is_open());
        assert_eq!(config.password(), "");
    }

    #[test]
    fn test_empty_ssid() {
        let result = ConnectionConfig::new("", "12345678", AuthMode::Wpa2Psk);
        assert_eq!(result, Err(ConfigError::SsidEmpty));
    }

    #[test]
    fn test_ssid_length_limits() {
        assert!(ConnectionConfig::open("a".repeat(32)).is_ok());
        let result = ConnectionConfig::open("a".repeat(33));
        assert!(matches!(
            result,
            Err(ConfigError::SsidTooLong { len: 33, max: 32 })
        ));
    }

    #[test]
    fn test_password_length_limits() {
        let short = ConnectionConfig::new("Net", "1234567", AuthMode::Wpa2Psk);
        assert!(matches!(short, Err(ConfigError::PasswordTooShort { .. })));

        assert!(ConnectionConfig::new("Net", "a".repeat(63), AuthMode::Wpa3Psk).is_ok());

        let long = ConnectionConfig::new("Net", "a".repeat(64), AuthMode::Wpa2Psk);
        assert!(matches!(long, Err(ConfigError::PasswordTooLong { .. })));
    }

    #[test]
    fn test_auth_mode_mismatch() {
        let psk_without_password = ConnectionConfig::new("Net", "", AuthMode::Wpa2Psk);
        assert!(matches!(
            psk_without_password,
            Err(ConfigError::AuthModeMismatch {
                has_password: false,
                ..
            })
        ));

        let open_with_password = ConnectionConfig::new("Net", "12345678", AuthMode::Open);
        assert!(matches!(
            open_with_password,
            Err(ConfigError::AuthModeMismatch {
                has_password: true,
                ..
            })
        ));
    }

    #[test]
    fn test_timing_validation() {
        let config = ConnectionConfig::open("Net").unwrap();
        assert_eq!(
            config.clone().with_connect_timeout_ms(0),
            Err(ConfigError::InvalidTimeout)
        );
        assert!(matches!(
            config.clone().with_backoff_ms(0, 100),
            Err(ConfigError::InvalidBackoff(_))
        ));
        assert!(matches!(
            config.clone().with_backoff_ms(500, 100),
            Err(ConfigError::InvalidBackoff(_))
        ));
        // Zero retries is allowed: a single attempt.
        assert_eq!(config.with_max_retries(0).unwrap().max_retries(), 0);
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ConnectionConfig::new("Net", "supersecret", AuthMode::Wpa2Psk).unwrap();
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("Net"));
        assert!(!debug_str.contains("supersecret"));
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_auth_mode_from_str() {
        assert_eq!("open".parse::<AuthMode>().unwrap(), AuthMode::Open);
        assert_eq!(" WPA2 ".parse::<AuthMode>().unwrap(), AuthMode::Wpa2Psk);
        assert_eq!("wpa3-psk".parse::<AuthMode>().unwrap(), AuthMode::Wpa3Psk);
        assert!(matches!(
            "wep".parse::<AuthMode>(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_country_code_from_str() {
        let code: CountryCode = "us".parse().unwrap();
        assert_eq!(code.as_str(), "US");
        assert_eq!(code.as_bytes(), *b"US");
        assert!("USA".parse::<CountryCode>().is_err());
        assert!("1A".parse::<CountryCode>().is_err());
        assert!("".parse::<CountryCode>().is_err());
    }

    // ==================== Environment Tests ====================

    #[test]
    fn test_from_lookup_minimal() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[
            ("WIFI_SSID", "Net"),
            ("WIFI_PASSWORD", "12345678"),
        ]))
        .unwrap();
        assert_eq!(config.auth_mode(), AuthMode::Wpa2Psk);
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_from_lookup_open_when_no_password() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[("WIFI_SSID", "Cafe")])).unwrap();
        assert!(config.is_open());
    }

    #[test]
    fn test_from_lookup_all_fields() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[
            ("WIFI_SSID", "Net"),
            ("WIFI_PASSWORD", "12345678"),
            ("WIFI_AUTH", "wpa3"),
            ("WIFI_COUNTRY", "de"),
            ("WIFI_CONNECT_TIMEOUT_MS", "1000"),
            ("WIFI_MAX_RETRIES", "2"),
            ("WIFI_BACKOFF_BASE_MS", "250"),
            ("WIFI_MAX_BACKOFF_MS", "4000"),
        ]))
        .unwrap();
        assert_eq!(config.auth_mode(), AuthMode::Wpa3Psk);
        assert_eq!(config.country_code().as_str(), "DE");
        assert_eq!(config.connect_timeout_ms(), 1000);
        assert_eq!(config.max_retries(), 2);
        assert_eq!(config.backoff_base_ms(), 250);
        assert_eq!(config.max_backoff_ms(), 4000);
    }

    #[test]
    fn test_from_lookup_missing_ssid() {
        let result = ConnectionConfig::from_lookup(lookup_from(&[("WIFI_PASSWORD", "12345678")]));
        assert_eq!(result, Err(ConfigError::MissingVariable("WIFI_SSID")));
    }

    #[test]
    fn test_from_lookup_bad_number() {
        let result = ConnectionConfig::from_lookup(lookup_from(&[
            ("WIFI_SSID", "Net"),
            ("WIFI_MAX_RETRIES", "lots"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                key: "WIFI_MAX_RETRIES",
                ..
            })
        ));
    }
}
