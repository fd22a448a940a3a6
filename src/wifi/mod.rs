//! WiFi connection lifecycle.
//!
//! # Components
//!
//! - [`manager`] - join/retry/backoff state machine over a [`crate::radio::RadioDriver`]
//! - [`state`] - lifecycle phases, state snapshots and the [`StateWatcher`]
//! - [`backoff`] - delay schedule between attempts
//! - [`error`] - typed errors for each operation
//!
//! Everything here is platform-independent and tested on the host with
//! [`crate::radio::ScriptedRadio`].

pub mod backoff;
pub mod error;
pub mod manager;
pub mod state;

pub use backoff::backoff_delay;
pub use error::{ConnectError, DisconnectError, InitError};
pub use manager::{ConnectionManager, ATTEMPT_GRACE};
pub use state::{ConnectionPhase, ConnectionState, FailureReason, StateWatcher};
