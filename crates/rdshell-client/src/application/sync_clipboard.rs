//! Clipboard sync policy between the local machine and the remote session.
//!
//! - **Outbound**: shortly after the display gains focus, read the local
//!   clipboard and, if it holds text, hand it to the manager.
//! - **Inbound**: whenever the manager reports remote clipboard data, write
//!   it to the local clipboard.
//!
//! Neither direction touches focus or binding state, so a read that resolves
//! after focus was lost still forwards its text.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::bridge_clipboard::ClipboardBridge;
use crate::application::deferred::{schedule_once, DeferredAction};
use crate::application::ports::RemoteManager;

#[derive(Clone)]
pub struct ClipboardSync {
    bridge: Arc<ClipboardBridge>,
    read_delay: Duration,
}

impl ClipboardSync {
    pub fn new(bridge: Arc<ClipboardBridge>, read_delay: Duration) -> Self {
        Self { bridge, read_delay }
    }

    /// Schedules one outbound push after the read delay.  Cancelling `token`
    /// before the delay elapses drops it.
    pub fn schedule_outbound(
        &self,
        token: &CancellationToken,
        manager: Arc<dyn RemoteManager>,
    ) -> DeferredAction {
        let bridge = Arc::clone(&self.bridge);
        schedule_once(token, "clipboard-read", self.read_delay, move || async move {
            push_outbound(&bridge, manager.as_ref()).await;
        })
    }

    /// Writes inbound remote text to the local clipboard in the background.
    pub fn pull_inbound(&self, text: String) -> JoinHandle<()> {
        let bridge = Arc::clone(&self.bridge);
        tokio::spawn(async move {
            bridge.write(&text).await;
            debug!(len = text.len(), "remote clipboard written locally");
        })
    }
}

/// Reads the local clipboard and forwards non-empty text to `manager`.
pub async fn push_outbound(bridge: &ClipboardBridge, manager: &dyn RemoteManager) {
    match bridge.read().await {
        Ok(text) if text.is_empty() => debug!("local clipboard empty; nothing sent"),
        Ok(text) => {
            debug!(len = text.len(), "local clipboard sent to remote");
            manager.send_remote_clipboard_data(&text);
        }
        Err(e) => warn!(error = %e, "local clipboard read failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bridge_clipboard::{ScratchDocument, SystemClipboard};
    use crate::infrastructure::clipboard::mock::{MockScratchDocument, MockSystemClipboard};
    use crate::infrastructure::remote::mock::{MockClient, MockDisplay, MockManager};
    use rdshell_core::Dimensions;

    fn sync_with(system: MockSystemClipboard, document: MockScratchDocument) -> (ClipboardSync, Arc<MockSystemClipboard>) {
        let system = Arc::new(system);
        let bridge = ClipboardBridge::new(
            Arc::clone(&system) as Arc<dyn SystemClipboard>,
            Arc::new(document) as Arc<dyn ScratchDocument>,
        );
        (ClipboardSync::new(Arc::new(bridge), Duration::from_millis(50)), system)
    }

    fn manager() -> Arc<MockManager> {
        let display = Arc::new(MockDisplay::new(Dimensions::new(1024, 768)));
        Arc::new(MockManager::new(Arc::new(MockClient::new(display))))
    }

    #[tokio::test(start_paused = true)]
    async fn test_outbound_sends_text_after_delay() {
        // Arrange
        let (sync, _system) = sync_with(MockSystemClipboard::with_text("hello"), MockScratchDocument::default());
        let manager = manager();
        let token = CancellationToken::new();

        // Act
        sync.schedule_outbound(&token, Arc::clone(&manager) as Arc<dyn RemoteManager>);
        tokio::time::sleep(Duration::from_millis(40)).await;
        let early = manager.sent_clipboard();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Assert
        assert!(early.is_empty());
        assert_eq!(manager.sent_clipboard(), vec!["hello".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outbound_skips_empty_clipboard() {
        let (sync, system) = sync_with(MockSystemClipboard::with_text(""), MockScratchDocument::default());
        let manager = manager();

        sync.schedule_outbound(&CancellationToken::new(), Arc::clone(&manager) as Arc<dyn RemoteManager>);
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(system.reads(), 1);
        assert!(manager.sent_clipboard().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_outbound_cancelled_by_teardown() {
        let (sync, system) = sync_with(MockSystemClipboard::with_text("hello"), MockScratchDocument::default());
        let manager = manager();
        let token = CancellationToken::new();

        sync.schedule_outbound(&token, Arc::clone(&manager) as Arc<dyn RemoteManager>);
        token.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(system.reads(), 0);
        assert!(manager.sent_clipboard().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_clipboard_sends_nothing() {
        let mut document = MockScratchDocument::default();
        document.reject_commands = true;
        let (sync, _system) = sync_with(MockSystemClipboard::unsupported(), document);
        let manager = manager();

        push_outbound(&sync.bridge, manager.as_ref()).await;

        assert!(manager.sent_clipboard().is_empty());
    }

    #[tokio::test]
    async fn test_inbound_writes_local_clipboard() {
        let (sync, system) = sync_with(MockSystemClipboard::with_text("old"), MockScratchDocument::default());

        sync.pull_inbound("from remote".to_string()).await.unwrap();

        assert_eq!(system.contents().as_deref(), Some("from remote"));
    }
}
