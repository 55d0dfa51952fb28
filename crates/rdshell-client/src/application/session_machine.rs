//! Session State Machine and fullscreen mirror.
//!
//! [`SessionMachine::apply`] is the single transition function from manager
//! states to UI state.  It never performs side effects itself; it returns
//! [`SessionEffect`]s for the shell to carry out, which keeps every
//! transition testable without collaborators.
//!
//! | Incoming | UI state | Effects |
//! |---|---|---|
//! | `CONNECTING` / `WAITING` | `CONNECTING` | none |
//! | `CONNECTED` | `CONNECTED` | active, notify success, show display |
//! | `DISCONNECTED` | `DISCONNECTED` | exit fullscreen, inactive, notify info |
//! | `CLIENT_ERROR` / `TUNNEL_ERROR` | `ERROR` | exit fullscreen, inactive, notify error |
//! | `IDLE` | `IDLE` | none |
//!
//! Leaving `CONNECTED` for any state additionally hides the display.

use std::fmt;
use std::sync::Arc;

use rdshell_core::{ManagerState, UiState};
use tracing::{debug, info, warn};

use crate::application::ports::{ElementHandle, FullscreenApi};

/// User-facing notification raised by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Connected,
    Disconnected,
    Failed(ManagerState),
}

/// Severity of a [`Notice`], mapped onto a log level by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

impl Notice {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Notice::Connected => NoticeLevel::Success,
            Notice::Disconnected => NoticeLevel::Info,
            Notice::Failed(_) => NoticeLevel::Error,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Connected => f.write_str("Connected"),
            Notice::Disconnected => f.write_str("Disconnected"),
            Notice::Failed(ManagerState::TunnelError) => {
                f.write_str("Connection to the gateway failed")
            }
            Notice::Failed(state) => write!(f, "Remote session failed ({state})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    ShowDisplay,
    HideDisplay,
    ExitFullscreen,
    Notify(Notice),
}

#[derive(Debug)]
pub struct SessionMachine {
    state: UiState,
    active: bool,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            state: UiState::Idle,
            active: false,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    /// `true` only between a `CONNECTED` and the next non-connected state.
    pub fn is_connected(&self) -> bool {
        self.active
    }

    /// The one state the shell may set on its own: right after it issues
    /// `connect`, before the manager reports anything.
    pub fn seed_connecting(&mut self) {
        self.state = UiState::Connecting;
        self.active = false;
    }

    /// Applies a manager state and returns the effects to perform, in order.
    pub fn apply(&mut self, incoming: ManagerState) -> Vec<SessionEffect> {
        let previous = self.state;
        let next = UiState::from(incoming);
        let mut effects = Vec::new();

        if previous == UiState::Connected && next != UiState::Connected {
            effects.push(SessionEffect::HideDisplay);
        }

        match incoming {
            ManagerState::Connected => {
                self.active = true;
                if previous != UiState::Connected {
                    effects.push(SessionEffect::ShowDisplay);
                    effects.push(SessionEffect::Notify(Notice::Connected));
                }
            }
            ManagerState::Disconnected => {
                self.active = false;
                effects.push(SessionEffect::ExitFullscreen);
                effects.push(SessionEffect::Notify(Notice::Disconnected));
            }
            ManagerState::ClientError | ManagerState::TunnelError => {
                self.active = false;
                effects.push(SessionEffect::ExitFullscreen);
                effects.push(SessionEffect::Notify(Notice::Failed(incoming)));
            }
            ManagerState::Idle | ManagerState::Connecting | ManagerState::Waiting => {
                self.active = false;
            }
        }

        debug!(%incoming, from = %previous, to = %next, "session transition");
        self.state = next;
        effects
    }
}

/// Local mirror of the browser fullscreen flag.
///
/// Only the browser's change event sets the flag.  An enter request stays
/// pending until the browser reports a change or refuses, and no second
/// request is issued while one is pending.
pub struct FullscreenMirror {
    api: Arc<dyn FullscreenApi>,
    active: bool,
    pending_enter: bool,
}

impl FullscreenMirror {
    pub fn new(api: Arc<dyn FullscreenApi>) -> Self {
        let active = api.is_enabled() && api.is_fullscreen();
        Self {
            api,
            active,
            pending_enter: false,
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.active
    }

    pub fn is_enter_pending(&self) -> bool {
        self.pending_enter
    }

    /// Requests fullscreen on `target`.  Returns `true` if a request was made.
    pub fn enter(&mut self, target: ElementHandle) -> bool {
        if self.active || self.pending_enter {
            debug!(pending = self.pending_enter, "fullscreen already active or requested");
            return false;
        }
        if !self.api.is_enabled() {
            debug!("fullscreen not supported here");
            return false;
        }
        self.api.request(target);
        self.pending_enter = true;
        debug!("fullscreen requested");
        true
    }

    /// Leaves fullscreen.  Returns `true` if an exit was performed.
    pub fn exit(&mut self) -> bool {
        self.pending_enter = false;
        if !self.active {
            return false;
        }
        if self.api.is_enabled() {
            self.api.exit();
        }
        self.active = false;
        info!("fullscreen exited");
        true
    }

    /// Records a browser fullscreen change and returns the new flag, which the
    /// caller forwards to the manager.
    pub fn on_browser_change(&mut self, fullscreen: bool) -> bool {
        self.pending_enter = false;
        if self.api.is_enabled() {
            if fullscreen && !self.active {
                info!("fullscreen entered");
            }
            self.active = fullscreen;
        }
        self.active
    }

    /// The browser rejected the pending request; a later enter may retry.
    pub fn on_request_refused(&mut self) {
        if std::mem::take(&mut self.pending_enter) {
            warn!("fullscreen request refused by the browser");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
