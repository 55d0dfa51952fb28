//! Display scaling.
//!
//! The remote framebuffer has a fixed native resolution; the local viewport
//! can be any size.  The shell shows the whole desktop by applying one
//! uniform factor to both axes: the largest factor for which the scaled
//! framebuffer still fits in the viewport.
//!
//! ```text
//! scale = min(viewport.width / remote.width, viewport.height / remote.height)
//! ```
//!
//! The factor is recomputed on every resize and never cached.  Entering
//! fullscreen at native size bypasses the fit entirely ([`ScaleMode::Original`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either side is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Errors returned by [`compute_scale`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScaleError {
    /// The remote display has not reported a usable size yet.
    #[error("remote display has no usable size yet ({0:?})")]
    EmptyRemote(Dimensions),

    /// The viewport has collapsed; any fitted factor would be zero.
    #[error("viewport has no usable size ({0:?})")]
    EmptyViewport(Dimensions),
}

/// A strictly positive, finite scale multiplier.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Native size: one remote pixel per local pixel.
    pub const ONE: ScaleFactor = ScaleFactor(1.0);

    /// Wraps `value` if it is finite and greater than zero.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    /// Maps a local (on-screen) coordinate back into remote framebuffer space.
    pub fn to_remote(self, local: f64) -> f64 {
        local / self.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::ONE
    }
}

/// How the display should be sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// Fit the whole framebuffer inside the viewport.
    #[default]
    Fit,
    /// Show the framebuffer at native resolution.
    Original,
}

/// Computes the fitted scale factor for `remote` inside `viewport`.
///
/// # Errors
///
/// - [`ScaleError::EmptyRemote`] if the remote width or height is 0.  Callers
///   should only scale after the display reports its size.
/// - [`ScaleError::EmptyViewport`] if the viewport has a zero side, since the
///   resulting factor would not be positive.
pub fn compute_scale(viewport: Dimensions, remote: Dimensions) -> Result<ScaleFactor, ScaleError> {
    if remote.is_empty() {
        return Err(ScaleError::EmptyRemote(remote));
    }
    if viewport.is_empty() {
        return Err(ScaleError::EmptyViewport(viewport));
    }

    let horizontal = f64::from(viewport.width) / f64::from(remote.width);
    let vertical = f64::from(viewport.height) / f64::from(remote.height);

    ScaleFactor::new(horizontal.min(vertical)).ok_or(ScaleError::EmptyViewport(viewport))
}

/// Like [`compute_scale`], but [`ScaleMode::Original`] always yields exactly 1.
///
/// # Errors
///
/// Same as [`compute_scale`] in [`ScaleMode::Fit`]; never fails in
/// [`ScaleMode::Original`].
pub fn resolve_scale(
    mode: ScaleMode,
    viewport: Dimensions,
    remote: Dimensions,
) -> Result<ScaleFactor, ScaleError> {
    match mode {
        ScaleMode::Original => Ok(ScaleFactor::ONE),
        ScaleMode::Fit => compute_scale(viewport, remote),
    }
}

/// Remote height as a percentage of remote width, used to reserve layout
/// space before the first frame arrives.  Returns `0.0` while the width is
/// still unknown, so the container may momentarily have zero height.
pub fn height_percent_of_width(remote: Dimensions) -> f64 {
    if remote.width == 0 {
        return 0.0;
    }
    100.0 * f64::from(remote.height) / f64::from(remote.width)
}

/// Minimum shell height for a component `component_width` pixels wide, keeping
/// the local screen's aspect ratio (minus a 2px border allowance).
pub fn component_min_height(component_width: u32, screen: Dimensions) -> u32 {
    if screen.width == 0 {
        return 0;
    }
    let exact = f64::from(component_width) * f64::from(screen.height) / f64::from(screen.width);
    let height = exact.ceil() as i64 - 2;
    height.clamp(0, i64::from(u32::MAX)) as u32
}

// ── Tests ─────────────────────────────────────────────────────────────────────
