//! Events pushed by the remote manager to the shell.
//!
//! The manager exposes six observable streams (`onStateChange`,
//! `onReconnect`, `onFullScreen`, `onRemoteClipboardData`, `onFocused`,
//! `onKeyboardReset`).  [`ManagerEvent`] folds them into one tagged union so
//! a single subscription, and a single cancellation, covers all of them.

use serde::{Deserialize, Serialize};

use crate::domain::state::ManagerState;

/// One event from the remote manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ManagerEvent {
    /// The connection lifecycle moved to a new state.
    StateChanged { state: ManagerState },

    /// The manager asks the shell to rebuild the session from scratch.
    Reconnect,

    /// The manager's fullscreen flag changed (or was requested).
    FullScreen { enabled: bool },

    /// The remote side placed text on its clipboard.
    RemoteClipboard { text: String },

    /// The manager's focus flag changed.
    Focused { focused: bool },

    /// Pressed-key state must be dropped (e.g. after a remote-side reset).
    KeyboardReset,
}

impl ManagerEvent {
    /// Short event name for log lines; never includes clipboard contents.
    pub fn kind(&self) -> &'static str {
        match self {
            ManagerEvent::StateChanged { .. } => "state_changed",
            ManagerEvent::Reconnect => "reconnect",
            ManagerEvent::FullScreen { .. } => "full_screen",
            ManagerEvent::RemoteClipboard { .. } => "remote_clipboard",
            ManagerEvent::Focused { .. } => "focused",
            ManagerEvent::KeyboardReset => "keyboard_reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_changed_json_carries_type_tag() {
        let event = ManagerEvent::StateChanged {
            state: ManagerState::Connected,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"StateChanged","state":"CONNECTED"}"#);
    }

    #[test]
    fn test_kind_does_not_leak_clipboard_text() {
        let event = ManagerEvent::RemoteClipboard {
            text: "hunter2".to_string(),
        };
        assert_eq!(event.kind(), "remote_clipboard");
    }
}
