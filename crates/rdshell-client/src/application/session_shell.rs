//! Session Shell: owns the single remote session and routes every input.
//!
//! # Ownership
//!
//! The shell is the only owner of the tunnel + manager pair, the state
//! machine, the fullscreen mirror, and the display controller.  It is driven
//! by exactly one task (see `infrastructure::runtime`), so none of that state
//! needs a lock.  Everything that happens elsewhere (manager events, timer
//! expiry, user commands, browser events) arrives as a [`ShellInput`].
//!
//! # Sessions and generations
//!
//! ```text
//! connect ──> factory.create ──> subscribe ──> spawn forwarder ──> manager.connect(params)
//!                                                  │
//!                     ShellInput::Manager { generation, event } ──> shell
//! ```
//!
//! Every session gets a new generation number and its own
//! `CancellationToken`.  The forwarder tags events with the generation, so
//! anything that was already in flight when a session was replaced is
//! recognised as stale and dropped.  Cancelling the token stops the
//! forwarder and every deferred action of that session.
//!
//! After an explicit disconnect the forwarder confirms its release with
//! [`ShellInput::SubscriptionReleased`]; a `Connect` arriving before that is
//! rejected with [`ShellError::TeardownInProgress`].

use std::sync::Arc;
use std::time::Duration;

use rdshell_core::{
    component_min_height, ConnectionParameters, Dimensions, ManagerEvent, ManagerState,
    ParameterError, UiState,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::bridge_clipboard::ClipboardBridge;
use crate::application::deferred::{schedule_once, DeferredAction};
use crate::application::display_session::DisplayController;
use crate::application::ports::{
    FullscreenApi, InputCaptureFactory, RemoteError, RemoteManager, RemoteSession, SessionFactory,
    SurfaceContainer, Tunnel,
};
use crate::application::session_machine::{
    FullscreenMirror, Notice, NoticeLevel, SessionEffect, SessionMachine,
};
use crate::application::sync_clipboard::ClipboardSync;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("invalid connection parameters: {0}")]
    InvalidParameters(#[from] ParameterError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("previous session is still being torn down")]
    TeardownInProgress,

    #[error("no active session")]
    NoSession,

    #[error("shell is not running")]
    Stopped,
}

/// Collaborators the shell is wired with.
#[derive(Clone)]
pub struct ShellDeps {
    pub factory: Arc<dyn SessionFactory>,
    pub capture: Arc<dyn InputCaptureFactory>,
    pub fullscreen: Arc<dyn FullscreenApi>,
    /// The element put into fullscreen.
    pub shell_container: Arc<dyn SurfaceContainer>,
    /// The viewport the display is mounted into and fitted to.
    pub display_container: Arc<dyn SurfaceContainer>,
    pub clipboard: Arc<ClipboardBridge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShellSettings {
    pub endpoint: String,
    pub parameters: ConnectionParameters,
    /// Wait after `CONNECTED` before mounting the display.
    pub settle_delay: Duration,
    /// Wait after focus gain before reading the local clipboard.
    pub clipboard_delay: Duration,
    pub control_panel_visible: bool,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8080/ws".to_string(),
            parameters: ConnectionParameters::default(),
            settle_delay: Duration::from_millis(100),
            clipboard_delay: Duration::from_millis(50),
            control_panel_visible: true,
        }
    }
}

/// User-facing operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Connect,
    Disconnect,
    /// Disconnect when connected, otherwise connect.
    ToggleConnection,
    EnterFullscreen,
    ExitFullscreen,
    ToggleControlPanel,
    /// Replaces the parameters used by the next connect.
    UpdateParameters(ConnectionParameters),
    /// Captures the display as PNG bytes.
    Screenshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Done,
    Screenshot(Vec<u8>),
}

pub type Responder = oneshot::Sender<Result<CommandReply, ShellError>>;

/// Events raised by the page around the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserEvent {
    FullscreenChanged { fullscreen: bool },
    /// The browser rejected a fullscreen request (e.g. no user gesture).
    FullscreenRefused,
    WindowResized { component_width: u32, screen: Dimensions },
    WindowBlur,
    ClickInsideDisplay,
    ClickOutsideDisplay,
}

/// Everything the shell reacts to, serialized through one channel.
pub enum ShellInput {
    Command {
        command: ShellCommand,
        reply: Option<Responder>,
    },
    Manager {
        generation: u64,
        event: ManagerEvent,
    },
    Browser(BrowserEvent),
    DisplaySettled {
        generation: u64,
    },
    SubscriptionReleased {
        generation: u64,
    },
}

/// Read-only view of the shell published after every input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellSnapshot {
    pub state: UiState,
    pub connected: bool,
    pub generation: u64,
    pub has_session: bool,
    pub teardown_pending: bool,
    pub fullscreen: bool,
    pub control_panel_visible: bool,
    pub focused: bool,
    pub input_bound: bool,
    pub display_mounted: bool,
    pub display_height_percent: f64,
    pub component_min_height: u32,
    pub last_notice: Option<String>,
    pub endpoint: String,
    pub parameters: ConnectionParameters,
}

struct ActiveSession {
    /// Correlates log lines across one session's lifetime.
    id: Uuid,
    generation: u64,
    tunnel: Arc<dyn Tunnel>,
    manager: Arc<dyn RemoteManager>,
    token: CancellationToken,
    forwarder: JoinHandle<()>,
    display: Option<DisplayController>,
    settle: Option<DeferredAction>,
}

pub struct SessionShell {
    deps: ShellDeps,
    settings: ShellSettings,
    clipboard: ClipboardSync,
    machine: SessionMachine,
    fullscreen: FullscreenMirror,
    session: Option<ActiveSession>,
    releasing: Option<u64>,
    next_generation: u64,
    control_panel_visible: bool,
    component_min_height: u32,
    last_notice: Option<Notice>,
    inputs: mpsc::Sender<ShellInput>,
}

impl SessionShell {
    /// `inputs` is the sending half of the channel this shell is driven from;
    /// forwarders and deferred actions post back through it.
    pub fn new(deps: ShellDeps, settings: ShellSettings, inputs: mpsc::Sender<ShellInput>) -> Self {
        let clipboard = ClipboardSync::new(Arc::clone(&deps.clipboard), settings.clipboard_delay);
        let fullscreen = FullscreenMirror::new(Arc::clone(&deps.fullscreen));
        Self {
            control_panel_visible: settings.control_panel_visible,
            deps,
            settings,
            clipboard,
            machine: SessionMachine::new(),
            fullscreen,
            session: None,
            releasing: None,
            next_generation: 0,
            component_min_height: 0,
            last_notice: None,
            inputs,
        }
    }

    pub fn dispatch(&mut self, input: ShellInput) {
        match input {
            ShellInput::Command { command, reply } => {
                let result = self.execute(command);
                match reply {
                    Some(reply) => {
                        let _ = reply.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            warn!(error = %e, "shell command failed");
                        }
                    }
                }
            }
            ShellInput::Manager { generation, event } => self.on_manager_event(generation, event),
            ShellInput::Browser(event) => self.on_browser_event(event),
            ShellInput::DisplaySettled { generation } => self.on_display_settled(generation),
            ShellInput::SubscriptionReleased { generation } => {
                if self.releasing == Some(generation) {
                    self.releasing = None;
                    debug!(generation, "session teardown complete");
                }
            }
        }
    }

    pub fn execute(&mut self, command: ShellCommand) -> Result<CommandReply, ShellError> {
        match command {
            ShellCommand::Connect => self.connect()?,
            ShellCommand::Disconnect => self.disconnect(),
            ShellCommand::ToggleConnection => {
                if self.session.is_some() && self.machine.is_connected() {
                    self.disconnect();
                } else {
                    self.connect()?;
                }
            }
            ShellCommand::EnterFullscreen => self.active_manager()?.set_full_screen(true),
            ShellCommand::ExitFullscreen => self.active_manager()?.set_full_screen(false),
            ShellCommand::ToggleControlPanel => {
                self.control_panel_visible = !self.control_panel_visible;
            }
            ShellCommand::UpdateParameters(parameters) => {
                parameters.validate()?;
                info!(hostname = %parameters.hostname, port = parameters.port, "connection parameters updated");
                self.settings.parameters = parameters;
            }
            ShellCommand::Screenshot => {
                let png = self.active_manager()?.create_screenshot()?;
                return Ok(CommandReply::Screenshot(png));
            }
        }
        Ok(CommandReply::Done)
    }

    /// Tears down the current session, if any.  Called when the shell stops.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            self.release(session, false);
        }
        info!("shell stopped");
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        let display = self.session.as_ref().and_then(|s| s.display.as_ref());
        ShellSnapshot {
            state: self.machine.state(),
            connected: self.machine.is_connected(),
            generation: self.session.as_ref().map_or(0, |s| s.generation),
            has_session: self.session.is_some(),
            teardown_pending: self.releasing.is_some(),
            fullscreen: self.fullscreen.is_fullscreen(),
            control_panel_visible: self.control_panel_visible,
            focused: display.is_some_and(DisplayController::is_focused),
            input_bound: display.is_some_and(DisplayController::is_bound),
            display_mounted: display.is_some_and(DisplayController::is_mounted),
            display_height_percent: display.map_or(0.0, DisplayController::height_percent_of_width),
            component_min_height: self.component_min_height,
            last_notice: self.last_notice.map(|n| n.to_string()),
            endpoint: self.settings.endpoint.clone(),
            parameters: self.settings.parameters.clone(),
        }
    }

    // ── Connection lifecycle ──────────────────────────────────────────────────

    fn connect(&mut self) -> Result<(), ShellError> {
        if let Some(generation) = self.releasing {
            warn!(generation, "connect rejected: previous session still tearing down");
            return Err(ShellError::TeardownInProgress);
        }
        self.settings.parameters.validate()?;
        if let Some(previous) = self.session.take() {
            self.release(previous, false);
        }
        self.open_session()
    }

    fn disconnect(&mut self) {
        let Some(session) = self.session.take() else {
            debug!("disconnect without a session");
            return;
        };
        self.release(session, true);
        // The subscription is closed, so apply the manager's terminal state here.
        let effects = self.machine.apply(ManagerState::Disconnected);
        self.run_effects(effects);
    }

    fn reconnect(&mut self) {
        info!("manager requested reconnect");
        if let Some(previous) = self.session.take() {
            self.release(previous, false);
        }
        if let Err(e) = self.open_session() {
            warn!(error = %e, "reconnect failed");
        }
    }

    fn open_session(&mut self) -> Result<(), ShellError> {
        self.next_generation += 1;
        let generation = self.next_generation;

        let RemoteSession { tunnel, manager } = match self.deps.factory.create(&self.settings.endpoint) {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, endpoint = %self.settings.endpoint, "could not build session");
                self.fail_session(ManagerState::TunnelError);
                return Err(e.into());
            }
        };

        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        let forwarder = tokio::spawn(forward_events(
            manager.subscribe(),
            self.inputs.clone(),
            generation,
            token.clone(),
        ));

        info!(
            session = %id,
            generation,
            endpoint = tunnel.endpoint(),
            hostname = %self.settings.parameters.hostname,
            port = self.settings.parameters.port,
            "connecting"
        );
        self.session = Some(ActiveSession {
            id,
            generation,
            tunnel,
            manager: Arc::clone(&manager),
            token,
            forwarder,
            display: None,
            settle: None,
        });
        self.machine.seed_connecting();

        if let Err(e) = manager.connect(&self.settings.parameters) {
            error!(generation, error = %e, "connect failed");
            self.fail_session(ManagerState::TunnelError);
            return Err(e.into());
        }
        Ok(())
    }

    fn fail_session(&mut self, state: ManagerState) {
        let effects = self.machine.apply(state);
        self.run_effects(effects);
    }

    /// Cancels everything the session owns and disconnects its manager.
    /// With `confirm`, new connects are refused until the forwarder reports
    /// that it has let go of the subscription.
    fn release(&mut self, mut session: ActiveSession, confirm: bool) {
        if let Some(settle) = session.settle.take() {
            settle.cancel();
        }
        if let Some(mut display) = session.display.take() {
            display.teardown();
        }
        session.token.cancel();
        session.manager.disconnect();
        // A forwarder that already stopped on its own has nothing left to confirm.
        if confirm && !session.forwarder.is_finished() {
            self.releasing = Some(session.generation);
        }
        info!(
            session = %session.id,
            generation = session.generation,
            endpoint = session.tunnel.endpoint(),
            "session released"
        );
    }

    fn active_manager(&self) -> Result<Arc<dyn RemoteManager>, ShellError> {
        self.session
            .as_ref()
            .map(|s| Arc::clone(&s.manager))
            .ok_or(ShellError::NoSession)
    }

    fn display_mut(&mut self) -> Option<&mut DisplayController> {
        self.session.as_mut().and_then(|s| s.display.as_mut())
    }

    // ── Event handling ────────────────────────────────────────────────────────

    fn on_manager_event(&mut self, generation: u64, event: ManagerEvent) {
        let current = self.session.as_ref().map(|s| s.generation);
        if current != Some(generation) {
            debug!(generation, ?current, kind = event.kind(), "stale manager event dropped");
            return;
        }
        debug!(generation, kind = event.kind(), "manager event");

        match event {
            ManagerEvent::StateChanged { state } => {
                let effects = self.machine.apply(state);
                self.run_effects(effects);
            }
            ManagerEvent::Reconnect => self.reconnect(),
            ManagerEvent::FullScreen { enabled } => self.on_manager_full_screen(enabled),
            ManagerEvent::RemoteClipboard { text } => {
                self.clipboard.pull_inbound(text);
            }
            ManagerEvent::Focused { focused } => {
                if let Some(display) = self.display_mut() {
                    display.handle_focused(focused);
                }
            }
            ManagerEvent::KeyboardReset => {
                if let Some(display) = self.display_mut() {
                    display.handle_keyboard_reset();
                }
            }
        }
    }

    fn on_manager_full_screen(&mut self, enabled: bool) {
        if enabled {
            self.fullscreen.enter(self.deps.shell_container.element());
            self.control_panel_visible = false;
        } else {
            self.fullscreen.exit();
        }
        if let Some(display) = self.display_mut() {
            display.handle_full_screen(enabled);
        }
    }

    fn on_browser_event(&mut self, event: BrowserEvent) {
        match event {
            BrowserEvent::FullscreenChanged { fullscreen } => {
                let flag = self.fullscreen.on_browser_change(fullscreen);
                if let Some(session) = self.session.as_ref() {
                    session.manager.set_full_screen(flag);
                }
            }
            BrowserEvent::FullscreenRefused => {
                self.fullscreen.on_request_refused();
                if let Some(session) = self.session.as_ref() {
                    session.manager.set_full_screen(false);
                }
            }
            BrowserEvent::WindowResized {
                component_width,
                screen,
            } => {
                self.component_min_height = component_min_height(component_width, screen);
                if let Some(display) = self.display_mut() {
                    display.handle_resize();
                }
            }
            BrowserEvent::WindowBlur => {
                if let Some(display) = self.display_mut() {
                    display.handle_window_blur();
                }
            }
            BrowserEvent::ClickInsideDisplay => {
                if let Some(display) = self.display_mut() {
                    display.handle_click_inside();
                }
            }
            BrowserEvent::ClickOutsideDisplay => {
                if let Some(display) = self.display_mut() {
                    display.handle_click_outside();
                }
            }
        }
    }

    fn on_display_settled(&mut self, generation: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.generation != generation {
            return;
        }
        session.settle = None;
        if let Some(display) = session.display.as_mut() {
            if let Err(e) = display.create_canvas() {
                warn!(generation, error = %e, "display could not be created");
            }
        }
    }

    fn run_effects(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::ShowDisplay => self.show_display(),
                SessionEffect::HideDisplay => self.hide_display(),
                SessionEffect::ExitFullscreen => {
                    self.fullscreen.exit();
                }
                SessionEffect::Notify(notice) => self.notify(notice),
            }
        }
    }

    fn show_display(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.display = Some(DisplayController::new(
            Arc::clone(&session.manager),
            Arc::clone(&self.deps.display_container),
            Arc::clone(&self.deps.capture),
            self.clipboard.clone(),
            &session.token,
        ));

        let inputs = self.inputs.clone();
        let generation = session.generation;
        session.settle = Some(schedule_once(
            &session.token,
            "display-settle",
            self.settings.settle_delay,
            move || async move {
                let _ = inputs.send(ShellInput::DisplaySettled { generation }).await;
            },
        ));
    }

    fn hide_display(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(settle) = session.settle.take() {
            settle.cancel();
        }
        if let Some(mut display) = session.display.take() {
            display.teardown();
        }
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level() {
            NoticeLevel::Success | NoticeLevel::Info => info!(%notice, "session notice"),
            NoticeLevel::Error => error!(%notice, "session notice"),
        }
        self.last_notice = Some(notice);
    }
}

/// Relays one session's manager events into the shell until `token` fires.
async fn forward_events(
    mut events: broadcast::Receiver<ManagerEvent>,
    inputs: mpsc::Sender<ShellInput>,
    generation: u64,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            received = events.recv() => match received {
                Ok(event) => {
                    if inputs.send(ShellInput::Manager { generation, event }).await.is_err() {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(generation, skipped, "manager events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    drop(events);
    let _ = inputs.send(ShellInput::SubscriptionReleased { generation }).await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
