//! Status reporting for the boot entry point.
//!
//! The connection manager stays silent; this module turns its state into log
//! lines, a process exit code and (on the host) a JSON status line.

use crate::wifi::{ConnectionPhase, ConnectionState, StateWatcher};
use log::{error, info, warn};

/// Exit code after a successful join.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for every failure.
pub const EXIT_FAILURE: i32 = 1;

/// Process exit code for a final state: 0 if connected, 1 otherwise.
pub fn exit_code(state: &ConnectionState) -> i32 {
    if state.phase.is_connected() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

/// One-line human-readable summary of a state.
pub fn describe(state: &ConnectionState) -> String {
    let mut line = format!("{} (attempts: {})", state.phase, state.attempt_count);
    if let Some(err) = state.last_error {
        line.push_str(&format!(", last error: {}", err));
    }
    if let Some(ms) = state.connected_at_ms {
        line.push_str(&format!(", connected after {} ms", ms));
    }
    line
}

/// Log one state transition at a level matching its severity.
pub fn log_state(state: &ConnectionState) {
    match state.phase {
        ConnectionPhase::Failed(_) => error!("WiFi {}", describe(state)),
        ConnectionPhase::Connecting if state.last_error.is_some() => {
            warn!("WiFi retrying: {}", describe(state))
        }
        _ => info!("WiFi {}", describe(state)),
    }
}

/// Log every transition until the connection reaches a terminal phase or the
/// manager is dropped.
pub async fn log_transitions(mut watcher: StateWatcher) {
    while let Some(state) = watcher.changed().await {
        log_state(&state);
        if state.phase.is_terminal() {
            break;
        }
    }
}

/// Render a state as a single JSON line.
#[cfg(not(target_os = "espidf"))]
pub fn to_json(state: &ConnectionState) -> String {
    serde_json::to_string(state).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::JoinError;
    use crate::wifi::{ConnectError, FailureReason};

    fn connected() -> ConnectionState {
        ConnectionState {
            phase: ConnectionPhase::Connected,
            attempt_count: 3,
            last_error: Some(JoinError::Timeout),
            connected_at_ms: Some(4_500),
        }
    }

    fn auth_failed() -> ConnectionState {
        ConnectionState {
            phase: ConnectionPhase::Failed(FailureReason::Connect(ConnectError::AuthRejected)),
            attempt_count: 1,
            last_error: Some(JoinError::AuthRejected),
            connected_at_ms: None,
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&connected()), EXIT_SUCCESS);
        assert_eq!(exit_code(&auth_failed()), EXIT_FAILURE);
        assert_eq!(exit_code(&ConnectionState::default()), EXIT_FAILURE);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&connected()),
            "connected (attempts: 3), last error: join timed out, connected after 4500 ms"
        );
        assert_eq!(
            describe(&auth_failed()),
            "failed:auth-rejected (attempts: 1), last error: credentials rejected"
        );
    }

    #[test]
    fn test_json_report() {
        let json = to_json(&connected());
        assert!(json.contains("\"phase\":\"Connected\""), "{}", json);
        assert!(json.contains("\"attempt_count\":3"), "{}", json);
        assert!(json.contains("\"last_error\":\"Timeout\""), "{}", json);
        assert!(json.contains("\"connected_at_ms\":4500"), "{}", json);

        let json = to_json(&auth_failed());
        assert!(
            json.contains("{\"Failed\":{\"Connect\":\"AuthRejected\"}}"),
            "{}",
            json
        );
    }
}
