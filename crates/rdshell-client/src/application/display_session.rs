//! Display controller: owns focus for one connected session.
//!
//! Created by the shell when the session reaches `CONNECTED` and torn down
//! when it leaves that state.  The controller composes the [`DisplayMount`]
//! and the [`InputBinder`] and reacts to:
//!
//! | Input | Reaction |
//! |---|---|
//! | manager `Focused(true)` | bind input, schedule the outbound clipboard read |
//! | manager `Focused(false)` | unbind input |
//! | manager `KeyboardReset` | reset the keyboard capture |
//! | manager `FullScreen(true)` | scale to native size, request focus |
//! | manager `FullScreen(false)` | refit |
//! | window resize | refit |
//! | window blur / click outside | request focus loss |
//! | click inside | request focus if not focused |
//!
//! Focus is never set locally from clicks: the controller asks the manager,
//! and the manager's `Focused` echo drives the actual change.

use std::sync::Arc;

use rdshell_core::ScaleMode;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::bind_input::{InputBinder, InputDevices};
use crate::application::deferred::DeferredAction;
use crate::application::mount_display::{DisplayMount, MountError};
use crate::application::ports::{InputCaptureFactory, RemoteManager, SurfaceContainer};
use crate::application::sync_clipboard::ClipboardSync;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("remote client is not available yet")]
    NoClient,

    #[error("display controller was torn down")]
    TornDown,
}

pub struct DisplayController {
    manager: Arc<dyn RemoteManager>,
    capture: Arc<dyn InputCaptureFactory>,
    clipboard: ClipboardSync,
    mount: DisplayMount,
    binder: Option<InputBinder>,
    focused: bool,
    token: CancellationToken,
    pending_reads: Vec<DeferredAction>,
}

impl DisplayController {
    /// `session_token` is the owning session's token; the controller works
    /// on a child of it so its own teardown leaves the session untouched.
    pub fn new(
        manager: Arc<dyn RemoteManager>,
        container: Arc<dyn SurfaceContainer>,
        capture: Arc<dyn InputCaptureFactory>,
        clipboard: ClipboardSync,
        session_token: &CancellationToken,
    ) -> Self {
        Self {
            manager,
            capture,
            clipboard,
            mount: DisplayMount::new(container),
            binder: None,
            focused: false,
            token: session_token.child_token(),
            pending_reads: Vec::new(),
        }
    }

    /// Mounts the display, creates the capture objects, and binds input if
    /// focus was already granted.  Runs once the layout has settled.
    ///
    /// # Errors
    ///
    /// - [`DisplayError::TornDown`] if `teardown` already ran.
    /// - [`DisplayError::NoClient`] if the manager has no client yet.
    pub fn create_canvas(&mut self) -> Result<(), DisplayError> {
        if self.token.is_cancelled() {
            return Err(DisplayError::TornDown);
        }
        let client = self.manager.client().ok_or(DisplayError::NoClient)?;
        let display = client.display();
        let surface = display.element();

        self.mount.mount(Arc::clone(&display));

        let mut binder = InputBinder::new(client, display);
        binder.attach(InputDevices {
            mouse: self.capture.mouse(surface),
            keyboard: self.capture.keyboard(),
        });
        if self.focused {
            binder.bind();
        }
        self.binder = Some(binder);
        info!(focused = self.focused, "display canvas created");
        Ok(())
    }

    pub fn handle_focused(&mut self, focused: bool) {
        if focused == self.focused {
            debug!(focused, "focus unchanged");
            return;
        }
        self.focused = focused;

        if focused {
            if let Some(binder) = self.binder.as_mut() {
                binder.bind();
            }
            self.pending_reads.retain(|read| !read.is_finished());
            let read = self
                .clipboard
                .schedule_outbound(&self.token, Arc::clone(&self.manager));
            self.pending_reads.push(read);
        } else if let Some(binder) = self.binder.as_mut() {
            binder.unbind();
        }
    }

    pub fn handle_keyboard_reset(&self) {
        if let Some(binder) = self.binder.as_ref() {
            binder.reset_keyboard();
        }
    }

    pub fn handle_full_screen(&mut self, enabled: bool) {
        if enabled {
            self.rescale(ScaleMode::Original);
            self.manager.set_focused(true);
        } else {
            self.rescale(ScaleMode::Fit);
        }
    }

    pub fn handle_resize(&mut self) {
        self.rescale(ScaleMode::Fit);
    }

    pub fn handle_window_blur(&self) {
        self.manager.set_focused(false);
    }

    pub fn handle_click_inside(&self) {
        if !self.focused {
            self.manager.set_focused(true);
        }
    }

    pub fn handle_click_outside(&self) {
        self.manager.set_focused(false);
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_bound(&self) -> bool {
        self.binder.as_ref().is_some_and(InputBinder::is_bound)
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_mounted()
    }

    pub fn height_percent_of_width(&self) -> f64 {
        self.mount.height_percent_of_width()
    }

    /// Unmounts, unbinds, and cancels pending clipboard reads.
    pub fn teardown(&mut self) {
        self.token.cancel();
        self.pending_reads.clear();
        if let Some(binder) = self.binder.as_mut() {
            binder.unbind();
        }
        self.binder = None;
        self.mount.unmount();
        debug!("display controller torn down");
    }

    fn rescale(&self, mode: ScaleMode) {
        match self.mount.apply_scale(mode) {
            Ok(_) => {}
            Err(MountError::NotMounted) => debug!(?mode, "rescale before mount ignored"),
            Err(e) => debug!(?mode, error = %e, "rescale skipped"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
