//! Scripted radio driver for host builds and tests.
//!
//! Replays a fixed sequence of join outcomes and counts every call, so the
//! connection manager's retry behaviour can be exercised without hardware.
//!
//! # Example
//!
//! ```
//! use jartis_wifi::radio::ScriptedRadio;
//!
//! // Two timeouts, then a successful join.
//! let radio = ScriptedRadio::from_script("timeout,timeout,ok").unwrap();
//! assert_eq!(radio.remaining_steps(), 3);
//! ```

use super::{JoinError, RadioDriver, RadioError};
use crate::config::{AuthMode, ConfigError, CountryCode};
use std::collections::VecDeque;
use std::time::Duration;

/// Environment variable holding a join script for the host binary.
pub const SIMULATE_ENV: &str = "WIFI_SIMULATE";

/// Script token that makes `init` fail.
const NO_RADIO_TOKEN: &str = "no-radio";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Join(Result<(), JoinError>),
    /// Never return; only the caller's timeout ends the attempt.
    Hang,
}

/// Radio driver that replays scripted join outcomes.
///
/// Once the script is exhausted every join succeeds. A scripted
/// [`JoinError::Timeout`] sleeps for the full timeout first, like real
/// hardware would.
#[derive(Debug, Default)]
pub struct ScriptedRadio {
    steps: VecDeque<Step>,
    init_failure: Option<RadioError>,
    join_delay: Duration,
    associated: bool,
    init_calls: u32,
    station_mode_calls: u32,
    connect_calls: u32,
    disconnect_calls: u32,
    last_country: Option<CountryCode>,
}

impl ScriptedRadio {
    /// Create a radio that returns the given outcomes in order.
    pub fn new(outcomes: impl IntoIterator<Item = Result<(), JoinError>>) -> Self {
        Self {
            steps: outcomes.into_iter().map(Step::Join).collect(),
            ..Default::default()
        }
    }

    /// Create a radio whose joins always succeed.
    pub fn always_ok() -> Self {
        Self::default()
    }

    /// Create a radio whose every join fails with `error`.
    pub fn always_failing(error: JoinError, attempts: usize) -> Self {
        Self::new(std::iter::repeat(Err(error)).take(attempts))
    }

    /// Create a radio whose `init` fails.
    pub fn without_hardware() -> Self {
        Self {
            init_failure: Some(RadioError::new("no radio detected")),
            ..Default::default()
        }
    }

    /// Parse a comma-separated script such as `"timeout,auth,ok"`.
    ///
    /// Tokens: `ok`, `timeout`, `auth`, `no-network`, `fail`, `hang`, and
    /// `no-radio` (makes `init` fail).
    pub fn from_script(script: &str) -> Result<Self, ConfigError> {
        let mut radio = Self::default();
        for token in script.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let step = match token.to_lowercase().as_str() {
                "ok" => Step::Join(Ok(())),
                "timeout" => Step::Join(Err(JoinError::Timeout)),
                "auth" | "auth-rejected" => Step::Join(Err(JoinError::AuthRejected)),
                "no-network" => Step::Join(Err(JoinError::NoNetwork)),
                "fail" | "failed" => Step::Join(Err(JoinError::Failed)),
                "hang" => Step::Hang,
                NO_RADIO_TOKEN => {
                    radio.init_failure = Some(RadioError::new("no radio detected"));
                    continue;
                }
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: SIMULATE_ENV,
                        value: token.to_string(),
                    })
                }
            };
            radio.steps.push_back(step);
        }
        Ok(radio)
    }

    /// Append an attempt that never completes on its own.
    pub fn then_hang(mut self) -> Self {
        self.steps.push_back(Step::Hang);
        self
    }

    /// Make every join take `delay` before reporting its outcome.
    pub fn with_join_delay(mut self, delay: Duration) -> Self {
        self.join_delay = delay;
        self
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls
    }

    pub fn station_mode_calls(&self) -> u32 {
        self.station_mode_calls
    }

    pub fn connect_calls(&self) -> u32 {
        self.connect_calls
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.disconnect_calls
    }

    /// Country passed to the last `init` call.
    pub fn last_country(&self) -> Option<CountryCode> {
        self.last_country
    }

    /// Whether the simulated radio is currently associated.
    pub fn is_associated(&self) -> bool {
        self.associated
    }
}

impl RadioDriver for ScriptedRadio {
    async fn init(&mut self, country: CountryCode) -> Result<(), RadioError> {
        self.init_calls += 1;
        self.last_country = Some(country);
        match &self.init_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn enable_station_mode(&mut self) -> Result<(), RadioError> {
        self.station_mode_calls += 1;
        Ok(())
    }

    async fn connect(
        &mut self,
        _ssid: &str,
        _password: &str,
        _auth_mode: AuthMode,
        timeout: Duration,
    ) -> Result<(), JoinError> {
        self.connect_calls += 1;

        if !self.join_delay.is_zero() {
            tokio::time::sleep(self.join_delay).await;
        }

        let outcome = match self.steps.pop_front().unwrap_or(Step::Join(Ok(()))) {
            Step::Join(outcome) => outcome,
            Step::Hang => std::future::pending().await,
        };

        if outcome == Err(JoinError::Timeout) {
            tokio::time::sleep(timeout).await;
        }

        self.associated = outcome.is_ok();
        outcome
    }

    async fn disconnect(&mut self) {
        self.disconnect_calls += 1;
        self.associated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let radio = ScriptedRadio::from_script("timeout, auth ,no-network,fail,ok,hang").unwrap();
        assert_eq!(radio.remaining_steps(), 6);
        assert!(radio.init_failure.is_none());
    }

    #[test]
    fn test_parse_empty_script() {
        let radio = ScriptedRadio::from_script("").unwrap();
        assert_eq!(radio.remaining_steps(), 0);
    }

    #[test]
    fn test_parse_no_radio() {
        let radio = ScriptedRadio::from_script("no-radio").unwrap();
        assert!(radio.init_failure.is_some());
        assert_eq!(radio.remaining_steps(), 0);
    }

    #[test]
    fn test_parse_unknown_token() {
        let result = ScriptedRadio::from_script("ok,reboot");
        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidValue {
                key: SIMULATE_ENV,
                value: "reboot".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_replays_outcomes_then_succeeds() {
        let mut radio = ScriptedRadio::new([Err(JoinError::NoNetwork)]);
        let timeout = Duration::from_millis(100);

        let first = radio.connect("Net", "", AuthMode::Open, timeout).await;
        assert_eq!(first, Err(JoinError::NoNetwork));
        assert!(!radio.is_associated());

        let second = radio.connect("Net", "", AuthMode::Open, timeout).await;
        assert_eq!(second, Ok(()));
        assert!(radio.is_associated());
        assert_eq!(radio.connect_calls(), 2);

        radio.disconnect().await;
        assert!(!radio.is_associated());
        assert_eq!(radio.disconnect_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_consumes_full_timeout() {
        let mut radio = ScriptedRadio::always_failing(JoinError::Timeout, 1);
        let start = tokio::time::Instant::now();

        let result = radio
            .connect("Net", "", AuthMode::Open, Duration::from_millis(750))
            .await;

        assert_eq!(result, Err(JoinError::Timeout));
        assert!(start.elapsed() >= Duration::from_millis(750));
    }

    #[tokio::test]
    async fn test_init_records_country() {
        let mut radio = ScriptedRadio::always_ok();
        let country: CountryCode = "NZ".parse().unwrap();

        radio.init(country).await.unwrap();
        radio.enable_station_mode().await.unwrap();

        assert_eq!(radio.last_country(), Some(country));
        assert_eq!(radio.init_calls(), 1);
        assert_eq!(radio.station_mode_calls(), 1);
    }

    #[tokio::test]
    async fn test_init_without_hardware() {
        let mut radio = ScriptedRadio::without_hardware();
        let result = radio.init(CountryCode::default()).await;
        assert!(result.is_err());
    }
}
