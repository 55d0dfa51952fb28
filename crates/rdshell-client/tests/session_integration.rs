//! Integration tests for the session shell running on its own task.
//!
//! Each test spawns the shell through `spawn_shell`, drives it only through
//! the public [`ShellHandle`] and the loopback adapters, and observes the
//! result through snapshots and the adapters' recorded calls.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rdshell_client::application::bridge_clipboard::{
    ClipboardBridge, ScratchDocument, SystemClipboard,
};
use rdshell_client::application::ports::{
    FullscreenApi, InputCaptureFactory, PointerSlot, SessionFactory, SurfaceContainer,
};
use rdshell_client::application::session_shell::{
    BrowserEvent, ShellCommand, ShellDeps, ShellSettings, ShellSnapshot,
};
use rdshell_client::infrastructure::clipboard::mock::{MockScratchDocument, MockSystemClipboard};
use rdshell_client::infrastructure::remote::mock::{
    MockCaptureFactory, MockContainer, MockFullscreen, MockSessionFactory,
};
use rdshell_client::infrastructure::runtime::{spawn_shell, ShellHandle};
use rdshell_core::{
    ConnectionParameters, Dimensions, ManagerEvent, ManagerState, MouseButtons, PointerEvent,
    UiState,
};

struct Fixture {
    handle: ShellHandle,
    factory: Arc<MockSessionFactory>,
    capture: Arc<MockCaptureFactory>,
    fullscreen: Arc<MockFullscreen>,
    clipboard: Arc<MockSystemClipboard>,
}

fn fixture(factory: MockSessionFactory) -> Fixture {
    let factory = Arc::new(factory);
    let capture = Arc::new(MockCaptureFactory::default());
    let fullscreen = Arc::new(MockFullscreen::new(true));
    let clipboard = Arc::new(MockSystemClipboard::with_text("local text"));

    let deps = ShellDeps {
        factory: Arc::clone(&factory) as Arc<dyn SessionFactory>,
        capture: Arc::clone(&capture) as Arc<dyn InputCaptureFactory>,
        fullscreen: Arc::clone(&fullscreen) as Arc<dyn FullscreenApi>,
        shell_container: Arc::new(MockContainer::new(Dimensions::new(800, 650)))
            as Arc<dyn SurfaceContainer>,
        display_container: Arc::new(MockContainer::new(Dimensions::new(800, 600)))
            as Arc<dyn SurfaceContainer>,
        clipboard: Arc::new(ClipboardBridge::new(
            Arc::clone(&clipboard) as Arc<dyn SystemClipboard>,
            Arc::new(MockScratchDocument::default()) as Arc<dyn ScratchDocument>,
        )),
    };
    let settings = ShellSettings {
        settle_delay: Duration::from_millis(5),
        clipboard_delay: Duration::from_millis(5),
        ..ShellSettings::default()
    };
    let (handle, _task) = spawn_shell(deps, settings, PathBuf::from("unused.png"));

    Fixture {
        handle,
        factory,
        capture,
        fullscreen,
        clipboard,
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
            updates.changed().await.expect("shell loop exited");
        }
    })
    .await
    .expect("shell did not reach expected state")
}

/// Polls `check` until it holds; for effects that do not show up in snapshots.
async fn eventually(check: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never became true");
}

#[tokio::test]
async fn test_manager_receives_connection_parameters_unmodified() {
    // Arrange
    let f = fixture(MockSessionFactory::new(Dimensions::new(1920, 1080)));
    let parameters = ConnectionParameters {
        hostname: "192.168.1.33".to_string(),
        port: 3389,
        ignore_cert: true,
        dpi: 96,
        width: 1920,
        height: 1080,
        image: "image/png".to_string(),
        audio: "audio/L16".to_string(),
    };

    // Act
    f.handle
        .request(ShellCommand::UpdateParameters(parameters.clone()))
        .await
        .unwrap();
    f.handle.request(ShellCommand::Connect).await.unwrap();

    // Assert
    let manager = f.factory.last_manager().unwrap();
    assert_eq!(manager.connects(), vec![parameters]);
    assert_eq!(f.handle.snapshot().state, UiState::Connecting);
}

#[tokio::test]
async fn test_pointer_is_normalised_into_remote_space_while_focused() {
    // Arrange
    let f = fixture(MockSessionFactory::loopback(Dimensions::new(1024, 768)));
    f.handle.request(ShellCommand::Connect).await.unwrap();
    wait_for(&f.handle, |s| s.display_mounted).await;

    // Act
    f.handle.browser(BrowserEvent::ClickInsideDisplay).await.unwrap();
    wait_for(&f.handle, |s| s.input_bound).await;
    let fired = f.capture.mouse.fire(
        PointerSlot::Move,
        PointerEvent::new(100.0, 100.0, MouseButtons::default()),
    );

    // Assert
    assert!(fired);
    let manager = f.factory.last_manager().unwrap();
    assert_eq!(manager.client.display.last_scale(), Some(0.78125));
    let sent = manager.client.mouse_states.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!((sent[0].x, sent[0].y), (128.0, 128.0));
}

#[tokio::test]
async fn test_disconnect_while_fullscreen_exits_fullscreen_once() {
    // Arrange
    let f = fixture(MockSessionFactory::loopback(Dimensions::new(1024, 768)));
    f.handle.request(ShellCommand::Connect).await.unwrap();
    wait_for(&f.handle, |s| s.state == UiState::Connected).await;
    f.handle.request(ShellCommand::EnterFullscreen).await.unwrap();
    let api = Arc::clone(&f.fullscreen);
    eventually(move || api.request_count() == 1).await;
    f.handle
        .browser(BrowserEvent::FullscreenChanged { fullscreen: true })
        .await
        .unwrap();
    wait_for(&f.handle, |s| s.fullscreen).await;

    // Act
    let manager = f.factory.last_manager().unwrap();
    manager.emit_state(ManagerState::Disconnected);
    let snapshot = wait_for(&f.handle, |s| s.state == UiState::Disconnected).await;

    // Assert
    assert!(!snapshot.fullscreen);
    assert!(!snapshot.display_mounted);
    assert_eq!(f.fullscreen.request_count(), 1);
    assert_eq!(f.fullscreen.exit_count(), 1);
    assert_eq!(snapshot.last_notice.as_deref(), Some("Disconnected"));
}

#[tokio::test]
async fn test_focus_pushes_local_clipboard_to_remote() {
    let f = fixture(MockSessionFactory::loopback(Dimensions::new(1024, 768)));
    f.handle.request(ShellCommand::Connect).await.unwrap();
    wait_for(&f.handle, |s| s.display_mounted).await;

    let manager = f.factory.last_manager().unwrap();
    manager.emit(ManagerEvent::Focused { focused: true });

    eventually(|| manager.sent_clipboard() == vec!["local text".to_string()]).await;
}

#[tokio::test]
async fn test_remote_clipboard_reaches_local_clipboard() {
    let f = fixture(MockSessionFactory::loopback(Dimensions::new(1024, 768)));
    f.handle.request(ShellCommand::Connect).await.unwrap();
    wait_for(&f.handle, |s| s.state == UiState::Connected).await;

    f.factory.last_manager().unwrap().emit(ManagerEvent::RemoteClipboard {
        text: "from remote".to_string(),
    });

    let clipboard = Arc::clone(&f.clipboard);
    eventually(move || clipboard.contents().as_deref() == Some("from remote")).await;
}

#[tokio::test]
async fn test_reconnect_after_disconnect_uses_fresh_session() {
    // Arrange
    let f = fixture(MockSessionFactory::loopback(Dimensions::new(1024, 768)));
    f.handle.request(ShellCommand::Connect).await.unwrap();
    wait_for(&f.handle, |s| s.state == UiState::Connected).await;

    // Act
    f.handle.request(ShellCommand::Disconnect).await.unwrap();
    wait_for(&f.handle, |s| !s.teardown_pending).await;
    f.handle.request(ShellCommand::Connect).await.unwrap();
    let snapshot = wait_for(&f.handle, |s| s.state == UiState::Connected).await;

    // Assert
    assert_eq!(f.factory.created(), 2);
    assert_eq!(snapshot.generation, 2);
    let first = f.factory.manager(0).unwrap();
    assert_eq!(first.disconnects(), 1);
    assert_eq!(first.subscriber_count(), 0);
}
