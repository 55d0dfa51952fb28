//! Clipboard Bridge: reads and writes the local clipboard.
//!
//! Two mechanisms are available in a browser page:
//!
//! 1. The asynchronous system clipboard API (`navigator.clipboard`), which
//!    may be missing entirely or refuse reads until permission is granted.
//! 2. The legacy selection path: create an offscreen editable element, put
//!    text in it (or focus it), and issue a `copy` / `paste` edit command.
//!
//! The bridge prefers (1) and falls back to (2).  The scratch element used by
//! (2) is always removed again, including when the edit command fails.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::ports::ElementHandle;

/// Errors produced while accessing the local clipboard.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("system clipboard API is not available")]
    Unsupported,

    #[error("clipboard read permission denied")]
    PermissionDenied,

    #[error("edit command `{0}` was rejected")]
    CommandRejected(&'static str),

    #[error("system clipboard failed: {0}")]
    System(String),

    /// Neither the system API nor the legacy path produced a value.
    #[error("clipboard unavailable (system: {system}; fallback: {fallback})")]
    Unavailable { system: String, fallback: String },
}

/// Result of the `clipboard-read` permission query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPermission {
    Granted,
    Denied,
    Prompt,
    /// Not queried yet, or the system API is missing.
    Unknown,
}

/// The asynchronous system clipboard API.
#[async_trait]
pub trait SystemClipboard: Send + Sync {
    fn is_supported(&self) -> bool;
    async fn read_permission(&self) -> ReadPermission;
    async fn read_text(&self) -> Result<String, ClipboardError>;
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Edit commands understood by the legacy selection path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCommand {
    Copy,
    Paste,
}

impl EditCommand {
    pub const fn as_str(self) -> &'static str {
        match self {
            EditCommand::Copy => "copy",
            EditCommand::Paste => "paste",
        }
    }
}

/// Page operations needed by the legacy selection path.
pub trait ScratchDocument: Send + Sync {
    /// Appends a new offscreen editable element to the page body.
    fn create_scratch(&self) -> ElementHandle;
    fn set_value(&self, scratch: ElementHandle, text: &str);
    fn value(&self, scratch: ElementHandle) -> String;
    fn focus(&self, scratch: ElementHandle);
    fn select(&self, scratch: ElementHandle);
    /// Returns `false` when the page refused the command.
    fn exec_command(&self, command: EditCommand) -> bool;
    fn remove(&self, scratch: ElementHandle);
}

/// Removes the scratch element when dropped.
struct ScratchGuard<'a> {
    document: &'a dyn ScratchDocument,
    element: ElementHandle,
}

impl<'a> ScratchGuard<'a> {
    fn create(document: &'a dyn ScratchDocument) -> Self {
        let element = document.create_scratch();
        Self { document, element }
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        self.document.remove(self.element);
    }
}

/// Local clipboard access with system-first, selection-fallback semantics.
pub struct ClipboardBridge {
    system: Arc<dyn SystemClipboard>,
    document: Arc<dyn ScratchDocument>,
    permission: Mutex<ReadPermission>,
}

impl ClipboardBridge {
    pub fn new(system: Arc<dyn SystemClipboard>, document: Arc<dyn ScratchDocument>) -> Self {
        Self {
            system,
            document,
            permission: Mutex::new(ReadPermission::Unknown),
        }
    }

    /// Queries the read permission and records it for status reporting.
    pub async fn refresh_permission(&self) -> ReadPermission {
        let state = if self.system.is_supported() {
            self.system.read_permission().await
        } else {
            ReadPermission::Unknown
        };
        self.record_permission(state);
        state
    }

    fn record_permission(&self, state: ReadPermission) {
        if let Ok(mut slot) = self.permission.lock() {
            *slot = state;
        }
        debug!(?state, "clipboard read permission");
    }

    /// Last recorded read permission.
    pub fn read_permission(&self) -> ReadPermission {
        self.permission
            .lock()
            .map(|slot| *slot)
            .unwrap_or(ReadPermission::Unknown)
    }

    pub fn is_read_granted(&self) -> bool {
        self.read_permission() == ReadPermission::Granted
    }

    /// Reads the local clipboard as text.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError::Unavailable`] when both the system API and
    /// the legacy paste path fail.
    pub async fn read(&self) -> Result<String, ClipboardError> {
        let system_failure = if self.system.is_supported() {
            match self.system.read_text().await {
                Ok(text) => return Ok(text),
                Err(ClipboardError::PermissionDenied) => {
                    self.record_permission(ReadPermission::Denied);
                    ClipboardError::PermissionDenied
                }
                Err(e) => e,
            }
        } else {
            ClipboardError::Unsupported
        };
        debug!(reason = %system_failure, "falling back to legacy paste");

        self.legacy_paste().map_err(|fallback| ClipboardError::Unavailable {
            system: system_failure.to_string(),
            fallback: fallback.to_string(),
        })
    }

    /// Writes `text` to the local clipboard.  Best-effort: failures are
    /// logged, never returned.
    pub async fn write(&self, text: &str) {
        if self.system.is_supported() {
            match self.system.write_text(text).await {
                Ok(()) => return,
                Err(e) => debug!(error = %e, "system clipboard write failed, using legacy copy"),
            }
        }

        if let Err(e) = self.legacy_copy(text) {
            warn!(error = %e, "could not write local clipboard");
        }
    }

    fn legacy_paste(&self) -> Result<String, ClipboardError> {
        let scratch = ScratchGuard::create(self.document.as_ref());
        self.document.focus(scratch.element);
        if !self.document.exec_command(EditCommand::Paste) {
            return Err(ClipboardError::CommandRejected(EditCommand::Paste.as_str()));
        }
        Ok(self.document.value(scratch.element))
    }

    fn legacy_copy(&self, text: &str) -> Result<(), ClipboardError> {
        let scratch = ScratchGuard::create(self.document.as_ref());
        self.document.set_value(scratch.element, text);
        self.document.select(scratch.element);
        if !self.document.exec_command(EditCommand::Copy) {
            return Err(ClipboardError::CommandRejected(EditCommand::Copy.as_str()));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clipboard::mock::{MockScratchDocument, MockSystemClipboard};

    fn bridge(
        system: MockSystemClipboard,
        document: MockScratchDocument,
    ) -> (ClipboardBridge, Arc<MockSystemClipboard>, Arc<MockScratchDocument>) {
        let system = Arc::new(system);
        let document = Arc::new(document);
        let bridge = ClipboardBridge::new(
            Arc::clone(&system) as Arc<dyn SystemClipboard>,
            Arc::clone(&document) as Arc<dyn ScratchDocument>,
        );
        (bridge, system, document)
    }

    #[tokio::test]
    async fn test_read_prefers_system_clipboard() {
        // Arrange
        let (bridge, _system, document) = bridge(
            MockSystemClipboard::with_text("from system"),
            MockScratchDocument::with_text("from selection"),
        );

        // Act
        let text = bridge.read().await.unwrap();

        // Assert
        assert_eq!(text, "from system");
        assert_eq!(document.created(), 0);
    }

    #[tokio::test]
    async fn test_read_falls_back_when_system_is_missing() {
        let (bridge, _system, document) = bridge(
            MockSystemClipboard::unsupported(),
            MockScratchDocument::with_text("from selection"),
        );

        let text = bridge.read().await.unwrap();

        assert_eq!(text, "from selection");
        assert_eq!(document.live(), 0, "scratch element must be removed");
    }

    #[tokio::test]
    async fn test_read_falls_back_when_system_read_is_denied() {
        let mut system = MockSystemClipboard::with_text("secret");
        system.fail_reads = true;
        let (bridge, _system, _document) =
            bridge(system, MockScratchDocument::with_text("pasted"));

        assert_eq!(bridge.read().await.unwrap(), "pasted");
    }

    #[tokio::test]
    async fn test_denied_system_read_is_recorded_as_denied_permission() {
        // Arrange
        let mut system = MockSystemClipboard::with_text("secret");
        system.fail_reads = true;
        let (bridge, _system, _document) =
            bridge(system, MockScratchDocument::with_text("pasted"));

        // Act
        let _ = bridge.read().await;

        // Assert
        assert_eq!(bridge.read_permission(), ReadPermission::Denied);
        assert!(!bridge.is_read_granted());
    }

    #[tokio::test]
    async fn test_read_reports_unavailable_and_still_removes_scratch() {
        let mut document = MockScratchDocument::with_text("ignored");
        document.reject_commands = true;
        let (bridge, _system, document) = bridge(MockSystemClipboard::unsupported(), document);

        let result = bridge.read().await;

        assert!(matches!(result, Err(ClipboardError::Unavailable { .. })));
        assert_eq!(document.created(), 1);
        assert_eq!(document.live(), 0);
    }

    #[tokio::test]
    async fn test_write_uses_system_clipboard_when_available() {
        let (bridge, system, document) =
            bridge(MockSystemClipboard::with_text(""), MockScratchDocument::default());

        bridge.write("hello").await;

        assert_eq!(system.contents().as_deref(), Some("hello"));
        assert_eq!(document.created(), 0);
    }

    #[tokio::test]
    async fn test_write_falls_back_to_selection_copy() {
        let (bridge, _system, document) =
            bridge(MockSystemClipboard::unsupported(), MockScratchDocument::default());

        bridge.write("hello").await;

        assert_eq!(document.copied(), vec!["hello".to_string()]);
        assert_eq!(document.live(), 0);
    }

    #[tokio::test]
    async fn test_write_falls_back_to_selection_copy_when_system_write_fails() {
        // Arrange
        let mut system = MockSystemClipboard::with_text("before");
        system.fail_writes = true;
        let (bridge, system, document) = bridge(system, MockScratchDocument::default());

        // Act
        bridge.write("from remote").await;

        // Assert
        assert_eq!(system.contents().as_deref(), Some("before"));
        assert_eq!(document.copied(), vec!["from remote".to_string()]);
        assert_eq!(document.live(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let mut document = MockScratchDocument::default();
        document.reject_commands = true;
        let (bridge, _system, document) = bridge(MockSystemClipboard::unsupported(), document);

        bridge.write("lost").await;

        assert!(document.copied().is_empty());
        assert_eq!(document.live(), 0);
    }

    #[tokio::test]
    async fn test_permission_is_recorded_after_refresh() {
        let mut system = MockSystemClipboard::with_text("");
        system.permission = ReadPermission::Granted;
        let (bridge, _system, _document) = bridge(system, MockScratchDocument::default());

        assert_eq!(bridge.read_permission(), ReadPermission::Unknown);
        bridge.refresh_permission().await;

        assert!(bridge.is_read_granted());
    }
}
