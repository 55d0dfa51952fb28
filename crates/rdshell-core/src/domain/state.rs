//! Session lifecycle states.
//!
//! The remote manager reports seven fine-grained states.  The shell collapses
//! them into five UI states; the mapping lives in `From<ManagerState> for
//! UiState` so there is exactly one place that decides it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state as reported by the remote manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagerState {
    Idle,
    Connecting,
    /// Tunnel is open; waiting for the remote side to start the session.
    Waiting,
    Connected,
    Disconnected,
    /// The protocol client failed (authentication, protocol violation, ...).
    ClientError,
    /// The transport failed (socket closed, gateway unreachable, ...).
    TunnelError,
}

impl ManagerState {
    /// Canonical upper-case name, as emitted by the manager.
    pub const fn as_str(self) -> &'static str {
        match self {
            ManagerState::Idle => "IDLE",
            ManagerState::Connecting => "CONNECTING",
            ManagerState::Waiting => "WAITING",
            ManagerState::Connected => "CONNECTED",
            ManagerState::Disconnected => "DISCONNECTED",
            ManagerState::ClientError => "CLIENT_ERROR",
            ManagerState::TunnelError => "TUNNEL_ERROR",
        }
    }
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapsed state shown by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl From<ManagerState> for UiState {
    fn from(state: ManagerState) -> Self {
        match state {
            ManagerState::Idle => UiState::Idle,
            ManagerState::Connecting | ManagerState::Waiting => UiState::Connecting,
            ManagerState::Connected => UiState::Connected,
            ManagerState::Disconnected => UiState::Disconnected,
            ManagerState::ClientError | ManagerState::TunnelError => UiState::Error,
        }
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UiState::Idle => "IDLE",
            UiState::Connecting => "CONNECTING",
            UiState::Connected => "CONNECTED",
            UiState::Disconnected => "DISCONNECTED",
            UiState::Error => "ERROR",
        };
        f.write_str(name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ManagerState; 7] = [
        ManagerState::Idle,
        ManagerState::Connecting,
        ManagerState::Waiting,
        ManagerState::Connected,
        ManagerState::Disconnected,
        ManagerState::ClientError,
        ManagerState::TunnelError,
    ];

    #[test]
    fn test_connecting_and_waiting_collapse_to_connecting() {
        assert_eq!(UiState::from(ManagerState::Connecting), UiState::Connecting);
        assert_eq!(UiState::from(ManagerState::Waiting), UiState::Connecting);
    }

    #[test]
    fn test_both_error_states_collapse_to_error() {
        assert_eq!(UiState::from(ManagerState::ClientError), UiState::Error);
        assert_eq!(UiState::from(ManagerState::TunnelError), UiState::Error);
    }

    #[test]
    fn test_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&ManagerState::TunnelError).unwrap();
        assert_eq!(json, r#""TUNNEL_ERROR""#);
    }

    #[test]
    fn test_display_name_matches_wire_name() {
        for state in ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }
}
