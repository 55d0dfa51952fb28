//! Typed input records forwarded to the remote session.
//!
//! The display library delivers pointer and key events from local capture
//! objects.  Before transmission the pointer position is normalized from
//! on-screen pixels into remote framebuffer pixels; otherwise a click on a
//! scaled-down canvas lands on the wrong remote pixel.

use serde::{Deserialize, Serialize};

use crate::domain::scale::ScaleFactor;

/// Button state carried with every pointer event.
///
/// `up` and `down` are the scroll-wheel "buttons".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MouseButtons {
    pub left: bool,
    pub middle: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MouseButtons {
    /// Only the left button pressed.
    pub const LEFT: MouseButtons = MouseButtons {
        left: true,
        middle: false,
        right: false,
        up: false,
        down: false,
    };
}

/// A pointer position plus button state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub buttons: MouseButtons,
}

impl PointerEvent {
    pub const fn new(x: f64, y: f64, buttons: MouseButtons) -> Self {
        Self { x, y, buttons }
    }
}

/// A key press or release identified by its X11 keysym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEvent {
    pub keysym: u32,
    pub pressed: bool,
}

impl KeyEvent {
    pub const fn down(keysym: u32) -> Self {
        Self { keysym, pressed: true }
    }

    pub const fn up(keysym: u32) -> Self {
        Self { keysym, pressed: false }
    }
}

/// Normalizes a locally captured pointer event into remote coordinates.
///
/// Divides both coordinates by `scale`; button flags pass through untouched.
pub fn translate_pointer_event(raw: &PointerEvent, scale: ScaleFactor) -> PointerEvent {
    PointerEvent {
        x: scale.to_remote(raw.x),
        y: scale.to_remote(raw.y),
        buttons: raw.buttons,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
