//! In-memory clipboard doubles.
//!
//! `MockSystemClipboard` stands in for the asynchronous system API and
//! `MockScratchDocument` for the legacy selection path.  Both record what
//! they were asked to do in `Mutex`-guarded fields so tests can assert on
//! it afterwards, and both expose failure switches for the fallback paths.
//!
//! ```ignore
//! let system = Arc::new(MockSystemClipboard::unsupported());
//! let document = Arc::new(MockScratchDocument::with_text("pasted"));
//! let bridge = ClipboardBridge::new(system, document.clone());
//!
//! assert_eq!(bridge.read().await.unwrap(), "pasted");
//! assert_eq!(document.live(), 0);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::bridge_clipboard::{
    ClipboardError, EditCommand, ReadPermission, ScratchDocument, SystemClipboard,
};
use crate::application::ports::ElementHandle;

/// Scratch element ids start high so they never collide with display ids.
const SCRATCH_ID_BASE: u64 = 0x5C_0000;

/// A system clipboard backed by a `Mutex<Option<String>>`.
pub struct MockSystemClipboard {
    /// When `false`, the bridge must take the legacy path.
    pub supported: bool,
    /// When `true`, `read_text` fails as if permission was denied.
    pub fail_reads: bool,
    /// When `true`, `write_text` fails.
    pub fail_writes: bool,
    /// Answer to the permission query.
    pub permission: ReadPermission,
    contents: Mutex<Option<String>>,
    reads: AtomicUsize,
}

impl MockSystemClipboard {
    /// A supported clipboard already holding `text`.
    pub fn with_text(text: &str) -> Self {
        Self {
            supported: true,
            fail_reads: false,
            fail_writes: false,
            permission: ReadPermission::Prompt,
            contents: Mutex::new(Some(text.to_string())),
            reads: AtomicUsize::new(0),
        }
    }

    /// An environment without the system clipboard API.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            contents: Mutex::new(None),
            ..Self::with_text("")
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap().clone()
    }

    pub fn set_contents(&self, text: &str) {
        *self.contents.lock().unwrap() = Some(text.to_string());
    }

    /// Number of successful or failed `read_text` calls.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SystemClipboard for MockSystemClipboard {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn read_permission(&self) -> ReadPermission {
        self.permission
    }

    async fn read_text(&self) -> Result<String, ClipboardError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.supported {
            return Err(ClipboardError::Unsupported);
        }
        if self.fail_reads {
            return Err(ClipboardError::PermissionDenied);
        }
        Ok(self.contents().unwrap_or_default())
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if !self.supported {
            return Err(ClipboardError::Unsupported);
        }
        if self.fail_writes {
            return Err(ClipboardError::System("mock failure".into()));
        }
        self.set_contents(text);
        Ok(())
    }
}

/// A page with a selection-based clipboard.
///
/// `paste` copies the simulated selection clipboard into the focused scratch
/// element; `copy` takes the selected scratch element's value.
#[derive(Default)]
pub struct MockScratchDocument {
    /// When `true`, every edit command is refused.
    pub reject_commands: bool,
    selection_clipboard: Mutex<String>,
    scratches: Mutex<HashMap<ElementHandle, String>>,
    focused: Mutex<Option<ElementHandle>>,
    selected: Mutex<Option<ElementHandle>>,
    copied: Mutex<Vec<String>>,
    next_id: AtomicU64,
    created: AtomicUsize,
}

impl MockScratchDocument {
    pub fn with_text(text: &str) -> Self {
        Self {
            selection_clipboard: Mutex::new(text.to_string()),
            ..Self::default()
        }
    }

    /// Scratch elements created so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Scratch elements still attached to the page.
    pub fn live(&self) -> usize {
        self.scratches.lock().unwrap().len()
    }

    /// Every value successfully copied through the selection path.
    pub fn copied(&self) -> Vec<String> {
        self.copied.lock().unwrap().clone()
    }
}

impl ScratchDocument for MockScratchDocument {
    fn create_scratch(&self) -> ElementHandle {
        let id = SCRATCH_ID_BASE + self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = ElementHandle(id);
        self.scratches.lock().unwrap().insert(handle, String::new());
        self.created.fetch_add(1, Ordering::SeqCst);
        handle
    }

    fn set_value(&self, scratch: ElementHandle, text: &str) {
        if let Some(value) = self.scratches.lock().unwrap().get_mut(&scratch) {
            *value = text.to_string();
        }
    }

    fn value(&self, scratch: ElementHandle) -> String {
        self.scratches
            .lock()
            .unwrap()
            .get(&scratch)
            .cloned()
            .unwrap_or_default()
    }

    fn focus(&self, scratch: ElementHandle) {
        *self.focused.lock().unwrap() = Some(scratch);
    }

    fn select(&self, scratch: ElementHandle) {
        *self.selected.lock().unwrap() = Some(scratch);
    }

    fn exec_command(&self, command: EditCommand) -> bool {
        if self.reject_commands {
            return false;
        }
        match command {
            EditCommand::Paste => {
                let Some(target) = *self.focused.lock().unwrap() else {
                    return false;
                };
                let text = self.selection_clipboard.lock().unwrap().clone();
                self.set_value(target, &text);
                true
            }
            EditCommand::Copy => {
                let Some(source) = *self.selected.lock().unwrap() else {
                    return false;
                };
                let text = self.value(source);
                *self.selection_clipboard.lock().unwrap() = text.clone();
                self.copied.lock().unwrap().push(text);
                true
            }
        }
    }

    fn remove(&self, scratch: ElementHandle) {
        self.scratches.lock().unwrap().remove(&scratch);
        let mut focused = self.focused.lock().unwrap();
        if *focused == Some(scratch) {
            *focused = None;
        }
        let mut selected = self.selected.lock().unwrap();
        if *selected == Some(scratch) {
            *selected = None;
        }
    }
}
