//! WiFi connection lifecycle manager.
//!
//! Drives a [`RadioDriver`] through a bounded, observable join sequence:
//!
//! ```text
//! Uninitialized --initialize()--> Initialized --connect()--> Connecting
//!       |                              ^                       |  ^
//!       v                              |                       |  | transient failure,
//!  Failed(Init)                  disconnect()                  |  | retries left (backoff)
//!                                      |                       v  |
//!                                  Connected <------ ok ---- attempt
//!                                                              |
//!                                  Failed(Connect) <-- auth / exhausted / cancelled
//! ```
//!
//! The manager does not log; callers observe it through [`StateWatcher`] or
//! the returned errors.
//!
//! # Example
//!
//! ```
//! use jartis_wifi::config::{AuthMode, ConnectionConfig};
//! use jartis_wifi::radio::{JoinError, ScriptedRadio};
//! use jartis_wifi::wifi::{ConnectionManager, ConnectionPhase};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = ConnectionConfig::new("Net", "12345678", AuthMode::Wpa2Psk)
//!     .unwrap()
//!     .with_connect_timeout_ms(50)
//!     .unwrap()
//!     .with_backoff_ms(10, 100)
//!     .unwrap();
//! let radio = ScriptedRadio::new([Err(JoinError::NoNetwork)]);
//!
//! let mut manager = ConnectionManager::new(config, radio);
//! manager.initialize().await.unwrap();
//! manager.connect().await.unwrap();
//!
//! let state = manager.current_state();
//! assert_eq!(state.phase, ConnectionPhase::Connected);
//! assert_eq!(state.attempt_count, 2);
//! # }
//! ```

use super::backoff::backoff_delay;
use super::error::{ConnectError, DisconnectError, InitError};
use super::state::{ConnectionPhase, ConnectionState, FailureReason, StateWatcher};
use crate::config::ConnectionConfig;
use crate::radio::{JoinError, RadioDriver};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Extra time granted to the driver beyond the join timeout before the
/// manager abandons the attempt itself.
pub const ATTEMPT_GRACE: Duration = Duration::from_millis(500);

/// Owns the join lifecycle for one radio.
///
/// Mutating operations take `&mut self`, so only one of `initialize`,
/// `connect` and `disconnect` can run at a time. Use [`watcher`] to read the
/// state from elsewhere while a `connect` is running.
///
/// [`watcher`]: ConnectionManager::watcher
pub struct ConnectionManager<D> {
    config: ConnectionConfig,
    driver: D,
    state: watch::Sender<ConnectionState>,
    created_at: Instant,
}

impl<D: RadioDriver> ConnectionManager<D> {
    /// Create a manager in [`ConnectionPhase::Uninitialized`].
    pub fn new(config: ConnectionConfig, driver: D) -> Self {
        let (state, _) = watch::channel(ConnectionState::default());
        Self {
            config,
            driver,
            state,
            created_at: Instant::now(),
        }
    }

    /// Bring up the radio in station mode.
    ///
    /// Calls the driver's `init` and `enable_station_mode` once. Later calls
    /// are no-ops, except after a failed bring-up, which is terminal and
    /// keeps returning [`InitError::HardwareUnavailable`] without touching
    /// the driver again.
    pub async fn initialize(&mut self) -> Result<(), InitError> {
        match self.phase() {
            ConnectionPhase::Uninitialized => {}
            ConnectionPhase::Failed(FailureReason::Init(err)) => return Err(err),
            _ => return Ok(()),
        }

        let result = match self.driver.init(self.config.country_code()).await {
            Ok(()) => self.driver.enable_station_mode().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.set_phase(ConnectionPhase::Initialized);
                Ok(())
            }
            Err(_) => {
                let err = InitError::HardwareUnavailable;
                self.set_phase(ConnectionPhase::Failed(FailureReason::Init(err)));
                Err(err)
            }
        }
    }

    /// Join the configured network, retrying transient failures.
    ///
    /// Equivalent to [`connect_with_cancel`] with a token nobody cancels.
    ///
    /// [`connect_with_cancel`]: ConnectionManager::connect_with_cancel
    pub async fn connect(&mut self) -> Result<(), ConnectError> {
        self.connect_with_cancel(&CancellationToken::new()).await
    }

    /// Join the configured network, stopping early if `cancel` fires.
    ///
    /// Makes up to `max_retries + 1` attempts, each bounded by the connect
    /// timeout, with exponential backoff between them. Rejected credentials
    /// end the loop immediately. Cancellation is checked before each attempt
    /// and raced against every backoff wait, but does not interrupt an
    /// attempt in progress.
    ///
    /// Returns `Ok(())` straight away if already connected. Starting again
    /// after a connect failure is allowed and resets the attempt counter.
    pub async fn connect_with_cancel(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<(), ConnectError> {
        match self.phase() {
            ConnectionPhase::Connected => return Ok(()),
            ConnectionPhase::Initialized
            | ConnectionPhase::Connecting
            | ConnectionPhase::Failed(FailureReason::Connect(_)) => {}
            ConnectionPhase::Uninitialized | ConnectionPhase::Failed(FailureReason::Init(_)) => {
                return Err(ConnectError::NotInitialized)
            }
        }

        self.state.send_modify(|s| {
            s.phase = ConnectionPhase::Connecting;
            s.attempt_count = 0;
            s.last_error = None;
            s.connected_at_ms = None;
        });

        let max_attempts = self.config.max_retries().saturating_add(1);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(self.fail(ConnectError::Cancelled));
            }

            attempt += 1;
            let delay = backoff_delay(
                self.config.backoff_base_ms(),
                self.config.max_backoff_ms(),
                attempt,
            );
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(self.fail(ConnectError::Cancelled)),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            self.state.send_modify(|s| s.attempt_count = attempt);

            let (error, overran) = match self.attempt().await {
                Ok(()) => {
                    let connected_at_ms = elapsed_ms(self.created_at.elapsed());
                    self.state.send_modify(|s| {
                        s.phase = ConnectionPhase::Connected;
                        s.connected_at_ms = Some(connected_at_ms);
                    });
                    return Ok(());
                }
                Err(failure) => failure,
            };

            self.state.send_modify(|s| s.last_error = Some(error));

            if !error.is_transient() {
                return Err(self.fail(ConnectError::AuthRejected));
            }
            if attempt >= max_attempts {
                let err = if overran {
                    ConnectError::Timeout
                } else {
                    ConnectError::RetriesExhausted
                };
                return Err(self.fail(err));
            }
        }
    }

    /// Leave the network and return to [`ConnectionPhase::Initialized`].
    ///
    /// Succeeds without touching the driver when not connected.
    pub async fn disconnect(&mut self) -> Result<(), DisconnectError> {
        if !self.phase().is_connected() {
            return Ok(());
        }

        self.driver.disconnect().await;
        self.state.send_modify(|s| {
            s.phase = ConnectionPhase::Initialized;
            s.connected_at_ms = None;
        });
        Ok(())
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Handle for observing the state from other tasks.
    pub fn watcher(&self) -> StateWatcher {
        StateWatcher::new(self.state.subscribe())
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Consume the manager and hand back the driver.
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// One join attempt. On failure, also reports whether the manager had to
    /// abandon a driver that ignored its timeout.
    async fn attempt(&mut self) -> Result<(), (JoinError, bool)> {
        let timeout = Duration::from_millis(u64::from(self.config.connect_timeout_ms()));
        let join = self.driver.connect(
            self.config.ssid(),
            self.config.password(),
            self.config.auth_mode(),
            timeout,
        );

        match tokio::time::timeout(timeout + ATTEMPT_GRACE, join).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err((e, false)),
            Err(_) => Err((JoinError::Timeout, true)),
        }
    }

    fn phase(&self) -> ConnectionPhase {
        self.state.borrow().phase
    }

    fn set_phase(&self, phase: ConnectionPhase) {
        self.state.send_modify(|s| s.phase = phase);
    }

    fn fail(&self, err: ConnectError) -> ConnectError {
        self.set_phase(ConnectionPhase::Failed(FailureReason::Connect(err)));
        err
    }
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
