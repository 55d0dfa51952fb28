//! # rdshell-core
//!
//! Shared domain library for the rdshell remote-desktop client containing the
//! connection parameter record, the session lifecycle states, the typed input
//! records, and the display scaling math.
//!
//! This crate has zero dependencies on async runtimes, UI frameworks, or the
//! remote-display library.  Everything here is plain data plus pure
//! functions, so it can be tested on any platform without setup.
//!
//! # Architecture overview (for beginners)
//!
//! rdshell shows one remote desktop inside a local viewport.  The actual wire
//! protocol and pixel decoding live in an external display library; the shell
//! only coordinates *when* things happen: connecting, mounting the remote
//! surface, capturing local input while focused, and keeping the picture
//! scaled to the available space.
//!
//! This crate (`rdshell-core`) is the shared foundation.  It defines:
//!
//! - **`domain::params`** – The fixed `ConnectionParameters` record that is
//!   handed to the remote manager unmodified.
//!
//! - **`domain::state`** – The manager's lifecycle states and the collapsed
//!   UI states the shell displays.
//!
//! - **`domain::events`** – The typed union of everything the manager can
//!   push to the shell (state changes, reconnect requests, focus, clipboard).
//!
//! - **`domain::input`** – Tagged pointer/key records and the transform that
//!   normalizes local pointer coordinates into remote framebuffer space.
//!
//! - **`domain::scale`** – The scale calculator mapping a remote resolution
//!   into a viewport.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `rdshell_core::ScaleFactor` instead of `rdshell_core::domain::scale::ScaleFactor`.
pub use domain::events::ManagerEvent;
pub use domain::input::{translate_pointer_event, KeyEvent, MouseButtons, PointerEvent};
pub use domain::params::{ConnectionParameters, ParameterError};
pub use domain::scale::{
    component_min_height, compute_scale, height_percent_of_width, resolve_scale, Dimensions,
    ScaleError, ScaleFactor, ScaleMode,
};
pub use domain::state::{ManagerState, UiState};
