//! Display Mount: attaches the remote display surface to its container and
//! keeps it scaled to the available space.

use std::sync::Arc;

use rdshell_core::{height_percent_of_width, resolve_scale, ScaleError, ScaleFactor, ScaleMode};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::ports::{Display, SurfaceContainer};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MountError {
    #[error("no display is mounted")]
    NotMounted,

    #[error(transparent)]
    Scale(#[from] ScaleError),
}

pub struct DisplayMount {
    container: Arc<dyn SurfaceContainer>,
    display: Option<Arc<dyn Display>>,
}

impl DisplayMount {
    pub fn new(container: Arc<dyn SurfaceContainer>) -> Self {
        Self {
            container,
            display: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.display.is_some()
    }

    pub fn display(&self) -> Option<&Arc<dyn Display>> {
        self.display.as_ref()
    }

    /// Appends the display surface to the container and applies the initial
    /// fitted scale.
    ///
    /// Mounting the same session's display twice is ignored.  A fit that
    /// cannot be computed yet (remote size still 0) is logged; the next
    /// resize applies it.
    pub fn mount(&mut self, display: Arc<dyn Display>) {
        if let Some(current) = self.display.as_ref() {
            if current.element() == display.element() {
                debug!("display already mounted");
                return;
            }
            self.unmount();
        }

        self.container.append(display.element());
        let (width, height) = (display.width(), display.height());
        info!(width, height, "display mounted");
        self.display = Some(display);

        if let Err(e) = self.apply_scale(ScaleMode::Fit) {
            warn!(error = %e, "initial display scale deferred");
        }
    }

    /// Removes the display surface.  No-op when nothing is mounted.
    pub fn unmount(&mut self) {
        let Some(display) = self.display.take() else {
            return;
        };
        if !self.container.remove(display.element()) {
            debug!("display element was already detached");
        }
        info!("display unmounted");
    }

    /// Recomputes and applies the display scale for `mode`.
    ///
    /// # Errors
    ///
    /// - [`MountError::NotMounted`] before `mount`.
    /// - [`MountError::Scale`] when the remote or viewport size is still 0
    ///   in [`ScaleMode::Fit`].
    pub fn apply_scale(&self, mode: ScaleMode) -> Result<ScaleFactor, MountError> {
        let display = self.display.as_ref().ok_or(MountError::NotMounted)?;
        let viewport = self.container.client_size();
        let scale = resolve_scale(mode, viewport, display.size())?;
        display.set_scale(scale.value());
        debug!(?mode, scale = scale.value(), ?viewport, "display scale applied");
        Ok(scale)
    }

    /// Remote height as a percentage of its width; `0` before a display
    /// exists or while its width is 0.
    pub fn height_percent_of_width(&self) -> f64 {
        self.display
            .as_ref()
            .map(|display| height_percent_of_width(display.size()))
            .unwrap_or(0.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
