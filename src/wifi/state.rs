//! Connection lifecycle state and the read-only handle used to observe it.

use super::error::{ConnectError, InitError};
use crate::radio::JoinError;
use std::fmt;
use tokio::sync::watch;

/// Why the manager ended up in [`ConnectionPhase::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(not(target_os = "espidf"), derive(serde::Serialize))]
pub enum FailureReason {
    Init(InitError),
    Connect(ConnectError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "{}", e.as_str()),
            Self::Connect(e) => write!(f, "{}", e.as_str()),
        }
    }
}

/// Lifecycle phase of the WiFi connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(not(target_os = "espidf"), derive(serde::Serialize))]
pub enum ConnectionPhase {
    /// Radio not brought up yet.
    #[default]
    Uninitialized,
    /// Radio is in station mode and idle.
    Initialized,
    /// A join attempt or backoff wait is in progress.
    Connecting,
    /// Joined the network.
    Connected,
    /// Terminal failure; needs new external input to leave.
    Failed(FailureReason),
}

impl ConnectionPhase {
    /// Whether no further automatic transition will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Connected | Self::Failed(_))
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initialized => write!(f, "initialized"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Failed(reason) => write!(f, "failed:{}", reason),
        }
    }
}

/// Snapshot of the manager's state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(not(target_os = "espidf"), derive(serde::Serialize))]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    /// Join attempts started by the current or last `connect()` call.
    pub attempt_count: u32,
    /// Outcome of the most recent failed attempt.
    pub last_error: Option<JoinError>,
    /// Milliseconds since manager creation at which the join succeeded.
    pub connected_at_ms: Option<u64>,
}

/// Read-only handle to a manager's state.
///
/// Cheap to clone and safe to move into other tasks; reading a snapshot
/// never waits for a running `connect()`.
#[derive(Debug, Clone)]
pub struct StateWatcher {
    rx: watch::Receiver<ConnectionState>,
}

impl StateWatcher {
    pub(crate) fn new(rx: watch::Receiver<ConnectionState>) -> Self {
        Self { rx }
    }

    /// Current state.
    pub fn snapshot(&self) -> ConnectionState {
        self.rx.borrow().clone()
    }

    /// Wait for the next state change.
    ///
    /// Returns `None` once the manager has been dropped.
    pub async fn changed(&mut self) -> Option<ConnectionState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until the state satisfies `predicate`, checking the current
    /// state first.
    ///
    /// Returns `None` if the manager is dropped before that happens.
    pub async fn wait_for<F>(&mut self, predicate: F) -> Option<ConnectionState>
    where
        F: FnMut(&ConnectionState) -> bool,
    {
        let state = self.rx.wait_for(predicate).await.ok()?;
        Some(state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = ConnectionState::default();
        assert_eq!(state.phase, ConnectionPhase::Uninitialized);
        assert_eq!(state.attempt_count, 0);
        assert_eq!(state.last_error, None);
        assert_eq!(state.connected_at_ms, None);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(ConnectionPhase::Uninitialized.to_string(), "uninitialized");
        assert_eq!(ConnectionPhase::Connected.to_string(), "connected");
        assert_eq!(
            ConnectionPhase::Failed(FailureReason::Connect(ConnectError::AuthRejected)).to_string(),
            "failed:auth-rejected"
        );
        assert_eq!(
            ConnectionPhase::Failed(FailureReason::Init(InitError::HardwareUnavailable))
                .to_string(),
            "failed:hardware-unavailable"
        );
    }

    #[test]
    fn test_terminal_phases() {
        assert!(!ConnectionPhase::Uninitialized.is_terminal());
        assert!(!ConnectionPhase::Initialized.is_terminal());
        assert!(!ConnectionPhase::Connecting.is_terminal());
        assert!(ConnectionPhase::Connected.is_terminal());
        assert!(
            ConnectionPhase::Failed(FailureReason::Connect(ConnectError::Cancelled)).is_terminal()
        );
    }

    #[tokio::test]
    async fn test_watcher_sees_changes() {
        let (tx, rx) = watch::channel(ConnectionState::default());
        let mut watcher = StateWatcher::new(rx);

        tx.send_modify(|s| s.phase = ConnectionPhase::Initialized);
        let state = watcher.changed().await.unwrap();
        assert_eq!(state.phase, ConnectionPhase::Initialized);
        assert_eq!(watcher.snapshot().phase, ConnectionPhase::Initialized);

        drop(tx);
        assert!(watcher.changed().await.is_none());
    }

    #[tokio::test]
    async fn test_wait_for_checks_current_state() {
        let (tx, rx) = watch::channel(ConnectionState::default());
        let mut watcher = StateWatcher::new(rx);
        tx.send_modify(|s| s.attempt_count = 2);

        let state = watcher
            .wait_for(|s| s.attempt_count == 2)
            .await
            .unwrap();
        assert_eq!(state.attempt_count, 2);
    }
}
