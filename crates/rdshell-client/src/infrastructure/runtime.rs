//! Shell runtime: the single task that drives a [`SessionShell`].
//!
//! ```text
//! ShellHandle::request ──┐
//! ShellHandle::browser ──┼──> mpsc<ShellInput> ──> run loop ──> shell.dispatch()
//! forwarders / timers  ──┘                             │
//!                                                      └──> watch<ShellSnapshot>
//! ```
//!
//! The loop owns the shell outright; callers only ever hold a
//! [`ShellHandle`].  After each input the loop publishes a fresh snapshot,
//! so a UI can render from the `watch` channel without touching the shell.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::bridge_clipboard::ClipboardBridge;
use crate::application::session_shell::{
    BrowserEvent, CommandReply, SessionShell, ShellCommand, ShellDeps, ShellError, ShellInput,
    ShellSettings, ShellSnapshot,
};
use crate::infrastructure::storage::screenshot::{save_screenshot, ScreenshotError};

/// Capacity of the shell input channel.
const INPUT_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum HandleError {
    #[error(transparent)]
    Shell(#[from] ShellError),

    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),

    #[error("unexpected reply to {0}")]
    UnexpectedReply(&'static str),
}

/// Cloneable front door to a running shell.
#[derive(Clone)]
pub struct ShellHandle {
    inputs: mpsc::Sender<ShellInput>,
    snapshots: watch::Receiver<ShellSnapshot>,
    shutdown: CancellationToken,
    screenshot_path: Arc<PathBuf>,
}

impl ShellHandle {
    /// Runs `command` on the shell and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns the shell's own error, or [`ShellError::Stopped`] if the loop
    /// has exited.
    pub async fn request(&self, command: ShellCommand) -> Result<CommandReply, ShellError> {
        let (reply, response) = oneshot::channel();
        self.inputs
            .send(ShellInput::Command {
                command,
                reply: Some(reply),
            })
            .await
            .map_err(|_| ShellError::Stopped)?;
        response.await.map_err(|_| ShellError::Stopped)?
    }

    /// Queues a browser event without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Stopped`] if the loop has exited.
    pub async fn browser(&self, event: BrowserEvent) -> Result<(), ShellError> {
        self.inputs
            .send(ShellInput::Browser(event))
            .await
            .map_err(|_| ShellError::Stopped)
    }

    /// Captures the display and writes it to the configured screenshot path.
    ///
    /// # Errors
    ///
    /// Fails if there is no session, the capture fails, or the file cannot be
    /// written.
    pub async fn save_screenshot(&self) -> Result<PathBuf, HandleError> {
        match self.request(ShellCommand::Screenshot).await? {
            CommandReply::Screenshot(png) => Ok(save_screenshot(&self.screenshot_path, &png).await?),
            CommandReply::Done => Err(HandleError::UnexpectedReply("screenshot")),
        }
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified after every processed input.
    pub fn subscribe(&self) -> watch::Receiver<ShellSnapshot> {
        self.snapshots.clone()
    }

    /// Asks the loop to tear the session down and exit.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Spawns the shell loop and returns its handle plus the loop's join handle.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_shell(
    deps: ShellDeps,
    settings: ShellSettings,
    screenshot_path: PathBuf,
) -> (ShellHandle, JoinHandle<()>) {
    let (inputs, receiver) = mpsc::channel(INPUT_CAPACITY);
    let clipboard = Arc::clone(&deps.clipboard);
    let shell = SessionShell::new(deps, settings, inputs.clone());
    let (snapshot_tx, snapshots) = watch::channel(shell.snapshot());
    let shutdown = CancellationToken::new();

    tokio::spawn(query_clipboard_permission(clipboard));
    let task = tokio::spawn(run_shell(shell, receiver, snapshot_tx, shutdown.clone()));

    let handle = ShellHandle {
        inputs,
        snapshots,
        shutdown,
        screenshot_path: Arc::new(screenshot_path),
    };
    (handle, task)
}

async fn run_shell(
    mut shell: SessionShell,
    mut inputs: mpsc::Receiver<ShellInput>,
    snapshots: watch::Sender<ShellSnapshot>,
    shutdown: CancellationToken,
) {
    info!("shell loop started");
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("shell shutdown requested");
                break;
            }
            input = inputs.recv() => match input {
                Some(input) => {
                    shell.dispatch(input);
                    snapshots.send_replace(shell.snapshot());
                }
                None => break,
            },
        }
    }
    shell.shutdown();
    snapshots.send_replace(shell.snapshot());
}

async fn query_clipboard_permission(bridge: Arc<ClipboardBridge>) {
    let permission = bridge.refresh_permission().await;
    if !bridge.is_read_granted() {
        warn!(?permission, "clipboard read not granted; local paste fallback will be used");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bridge_clipboard::{ScratchDocument, SystemClipboard};
    use crate::application::ports::{
        FullscreenApi, InputCaptureFactory, SessionFactory, SurfaceContainer,
    };
    use crate::infrastructure::clipboard::mock::{MockScratchDocument, MockSystemClipboard};
    use crate::infrastructure::remote::mock::{
        MockCaptureFactory, MockContainer, MockFullscreen, MockSessionFactory,
    };
    use rdshell_core::{Dimensions, UiState};
    use std::time::Duration;
    use uuid::Uuid;

    fn deps(factory: Arc<MockSessionFactory>) -> ShellDeps {
        ShellDeps {
            factory: factory as Arc<dyn SessionFactory>,
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
        }
    }

    async fn wait_for(handle: &ShellHandle, predicate: impl Fn(&ShellSnapshot) -> bool) -> ShellSnapshot {
        let mut updates = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let current = updates.borrow_and_update().clone();
                if predicate(&current) {
                    return current;
                }
                if updates.changed().await.is_err() {
                    return current;
                }
            }
        })
        .await
        .expect("shell did not reach expected state")
    }

    #[tokio::test]
    async fn test_loopback_connect_reaches_connected() {
        // Arrange
        let factory = Arc::new(MockSessionFactory::loopback(Dimensions::new(1024, 768)));
        let (handle, task) = spawn_shell(deps(factory), ShellSettings::default(), PathBuf::from("unused.png"));

        // Act
        tokio_test::assert_ok!(handle.request(ShellCommand::Connect).await);
        let snapshot = wait_for(&handle, |s| s.state == UiState::Connected).await;

        // Assert
        assert!(snapshot.connected);
        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_request_after_shutdown_reports_stopped() {
        let factory = Arc::new(MockSessionFactory::new(Dimensions::new(1024, 768)));
        let (handle, task) = spawn_shell(deps(factory), ShellSettings::default(), PathBuf::from("unused.png"));

        handle.shutdown();
        task.await.unwrap();
        let result = handle.request(ShellCommand::Connect).await;

        assert!(matches!(tokio_test::assert_err!(result), ShellError::Stopped));
    }

    #[tokio::test]
    async fn test_shutdown_releases_session() {
        let factory = Arc::new(MockSessionFactory::loopback(Dimensions::new(1024, 768)));
        let (handle, task) =
            spawn_shell(deps(Arc::clone(&factory)), ShellSettings::default(), PathBuf::from("unused.png"));
        handle.request(ShellCommand::Connect).await.unwrap();

        handle.shutdown();
        task.await.unwrap();

        assert_eq!(factory.last_manager().unwrap().disconnects(), 1);
        assert!(!handle.snapshot().has_session);
    }

    #[tokio::test]
    async fn test_save_screenshot_writes_png() {
        let factory = Arc::new(MockSessionFactory::loopback(Dimensions::new(640, 480)));
        let dir = std::env::temp_dir().join(format!("rdshell_rt_{}", Uuid::new_v4()));
        let path = dir.join("screenshot.png");
        let (handle, task) = spawn_shell(deps(factory), ShellSettings::default(), path.clone());
        handle.request(ShellCommand::Connect).await.unwrap();

        let saved = handle.save_screenshot().await.unwrap();

        assert_eq!(saved, path);
        assert!(std::fs::read(&path).unwrap().starts_with(&[0x89, b'P', b'N', b'G']));
        handle.shutdown();
        task.await.unwrap();
        std::fs::remove_dir_all(&dir).ok();
    }
}
