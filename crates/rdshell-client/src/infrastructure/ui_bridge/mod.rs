//! UI command bridge for the session shell.
//!
//! Exposes the shell's state and operations to a web UI as plain async
//! functions returning serializable DTOs.  Only this module knows both the
//! runtime handle and the presentation shapes.
//!
//! # How the bridge is used (for beginners)
//!
//! The UI never touches the shell directly.  It calls a command, the command
//! forwards a [`ShellCommand`] through the [`ShellHandle`], and the answer
//! comes back wrapped in a uniform envelope:
//!
//! ```text
//! UI                          bridge                     shell loop
//! ──────────────────────────────────────────────────────────────────
//! connect_session()  ──────>  handle.request(Connect) ──> SessionShell
//!                    <──────  CommandResult<()>
//! get_session_status() ────>  handle.snapshot()
//!                    <──────  CommandResult<SessionStatusDto>
//! ```
//!
//! # `CommandResult<T>`
//!
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```
//!
//! The UI uses one error-handling path for every command regardless of its
//! return type.

use rdshell_core::ConnectionParameters;
use serde::{Deserialize, Serialize};

use crate::application::session_shell::{ShellCommand, ShellSnapshot};
use crate::infrastructure::runtime::ShellHandle;

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Status snapshot returned to the UI.
///
/// `state` is the collapsed UI state name (`"CONNECTING"`, `"CONNECTED"`,
/// `"DISCONNECTED"`, `"ERROR"`, `"IDLE"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatusDto {
    pub state: String,
    pub connected: bool,
    pub fullscreen: bool,
    pub control_panel_visible: bool,
    pub focused: bool,
    /// CSS `padding-bottom` percentage reserving the display's aspect ratio.
    pub display_proportion: String,
    /// CSS `min-height` of the shell, e.g. `"561px"`.
    pub component_min_height: String,
    pub notice: Option<String>,
    pub endpoint: String,
}

impl From<&ShellSnapshot> for SessionStatusDto {
    fn from(snapshot: &ShellSnapshot) -> Self {
        Self {
            state: snapshot.state.to_string(),
            connected: snapshot.connected,
            fullscreen: snapshot.fullscreen,
            control_panel_visible: snapshot.control_panel_visible,
            focused: snapshot.focused,
            display_proportion: format!("{}%", snapshot.display_height_percent),
            component_min_height: format!("{}px", snapshot.component_min_height),
            notice: snapshot.last_notice.clone(),
            endpoint: snapshot.endpoint.clone(),
        }
    }
}

/// Unified response wrapper for bridge commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

impl<T: Serialize, E: std::fmt::Display> From<Result<T, E>> for CommandResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns the current session status.  Polled by the UI; never blocks on
/// the shell loop.
pub fn get_session_status(handle: &ShellHandle) -> CommandResult<SessionStatusDto> {
    CommandResult::ok(SessionStatusDto::from(&handle.snapshot()))
}

pub async fn connect_session(handle: &ShellHandle) -> CommandResult<()> {
    run(handle, ShellCommand::Connect).await
}

pub async fn disconnect_session(handle: &ShellHandle) -> CommandResult<()> {
    run(handle, ShellCommand::Disconnect).await
}

/// The connect/disconnect button.
pub async fn toggle_connection(handle: &ShellHandle) -> CommandResult<()> {
    run(handle, ShellCommand::ToggleConnection).await
}

/// The fullscreen button: enters when windowed, exits when fullscreen.
pub async fn toggle_fullscreen(handle: &ShellHandle) -> CommandResult<()> {
    let command = if handle.snapshot().fullscreen {
        ShellCommand::ExitFullscreen
    } else {
        ShellCommand::EnterFullscreen
    };
    run(handle, command).await
}

pub async fn toggle_control_panel(handle: &ShellHandle) -> CommandResult<bool> {
    match handle.request(ShellCommand::ToggleControlPanel).await {
        Ok(_) => CommandResult::ok(handle.snapshot().control_panel_visible),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Saves a screenshot and returns the file path.
pub async fn take_screenshot(handle: &ShellHandle) -> CommandResult<String> {
    handle
        .save_screenshot()
        .await
        .map(|path| path.display().to_string())
        .into()
}

/// Parameters the next connect will use.
pub fn get_connection_settings(handle: &ShellHandle) -> CommandResult<ConnectionParameters> {
    CommandResult::ok(handle.snapshot().parameters)
}

/// Replaces the connection parameters.  The shell rejects invalid ones and
/// the error comes back in the envelope.
pub async fn update_connection_settings(
    handle: &ShellHandle,
    parameters: ConnectionParameters,
) -> CommandResult<()> {
    run(handle, ShellCommand::UpdateParameters(parameters)).await
}

async fn run(handle: &ShellHandle, command: ShellCommand) -> CommandResult<()> {
    handle.request(command).await.map(|_| ()).into()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::application::bridge_clipboard::{ClipboardBridge, ScratchDocument, SystemClipboard};
    use crate::application::ports::{
        FullscreenApi, InputCaptureFactory, SessionFactory, SurfaceContainer,
    };
    use crate::application::session_shell::{ShellDeps, ShellSettings};
    use crate::infrastructure::clipboard::mock::{MockScratchDocument, MockSystemClipboard};
    use crate::infrastructure::remote::mock::{
        MockCaptureFactory, MockContainer, MockFullscreen, MockSessionFactory,
    };
    use crate::infrastructure::runtime::spawn_shell;
    use rdshell_core::Dimensions;

    fn make_handle() -> ShellHandle {
        let deps = ShellDeps {
            factory: Arc::new(MockSessionFactory::new(Dimensions::new(1024, 768))) as Arc<dyn SessionFactory>,
            capture: Arc::new(MockCaptureFactory::default()) as Arc<dyn InputCaptureFactory>,
            fullscreen: Arc::new(MockFullscreen::new(true)) as Arc<dyn FullscreenApi>,
            shell_container: Arc::new(MockContainer::new(Dimensions::new(800, 650)))
                as Arc<dyn SurfaceContainer>,
            display_container: Arc::new(MockContainer::new(Dimensions::new(800, 600)))
                as Arc<dyn SurfaceContainer>,
            clipboard: Arc::new(ClipboardBridge::new(
                Arc::new(MockSystemClipboard::with_text("")) as Arc<dyn SystemClipboard>,
                Arc::new(MockScratchDocument::default()) as Arc<dyn ScratchDocument>,
            )),
        };
        spawn_shell(deps, ShellSettings::default(), PathBuf::from("screenshot.png")).0
    }

    #[tokio::test]
    async fn test_get_session_status_is_idle_initially() {
        // Arrange
        let handle = make_handle();

        // Act
        let result = get_session_status(&handle);

        // Assert
        assert!(result.success);
        let dto = result.data.unwrap();
        assert_eq!(dto.state, "IDLE");
        assert_eq!(dto.display_proportion, "0%");
        assert!(dto.control_panel_visible);
    }

    #[tokio::test]
    async fn test_connect_session_reports_connecting() {
        let handle = make_handle();

        let result = connect_session(&handle).await;

        assert!(result.success);
        assert_eq!(get_session_status(&handle).data.unwrap().state, "CONNECTING");
    }

    #[tokio::test]
    async fn test_update_connection_settings_applies_new_values() {
        // Arrange
        let handle = make_handle();
        let parameters = ConnectionParameters {
            hostname: "192.168.1.33".to_string(),
            ignore_cert: true,
            ..ConnectionParameters::default()
        };

        // Act
        let result = update_connection_settings(&handle, parameters.clone()).await;

        // Assert
        assert!(result.success);
        assert_eq!(get_connection_settings(&handle).data.unwrap(), parameters);
    }

    #[tokio::test]
    async fn test_update_connection_settings_rejects_blank_hostname() {
        let handle = make_handle();
        let parameters = ConnectionParameters {
            hostname: "   ".to_string(),
            ..ConnectionParameters::default()
        };

        let result = update_connection_settings(&handle, parameters).await;

        assert!(!result.success);
        assert!(result.error.is_some());
        assert_eq!(get_connection_settings(&handle).data.unwrap(), ConnectionParameters::default());
    }

    #[tokio::test]
    async fn test_take_screenshot_without_session_fails() {
        let handle = make_handle();

        let result = take_screenshot(&handle).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no active session"));
    }

    #[tokio::test]
    async fn test_toggle_control_panel_returns_new_visibility() {
        let handle = make_handle();
        let result = toggle_control_panel(&handle).await;
        assert_eq!(result.data, Some(false));
    }

    #[test]
    fn test_command_result_ok_sets_success_true() {
        let r: CommandResult<u32> = CommandResult::ok(99);
        assert!(r.success);
        assert_eq!(r.data.unwrap(), 99);
        assert!(r.error.is_none());
    }

    #[test]
    fn test_command_result_err_sets_success_false() {
        let r: CommandResult<u32> = CommandResult::err("oops");
        assert!(!r.success);
        assert!(r.data.is_none());
        assert_eq!(r.error.unwrap(), "oops");
    }
}
