//! Application layer for the session shell.
//!
//! Everything here is written against the traits in [`ports`] and
//! [`bridge_clipboard`]; nothing imports `infrastructure`.
//!
//! # What lives here? (for beginners)
//!
//! - **`session_machine`** – Pure transition function from remote manager
//!   states to the five UI states, plus the local fullscreen mirror.
//!
//! - **`session_shell`** – The shell itself: owns the current session,
//!   routes commands, manager events and browser events, and carries out the
//!   effects the machine asks for.
//!
//! - **`display_session`** – One connected display: mounting, focus, input
//!   binding and deferred clipboard reads.  Created on `CONNECTED`, torn
//!   down when the connection ends.
//!
//! - **`mount_display`** / **`bind_input`** – The two halves of a display
//!   session: where the surface lives and where input goes.
//!
//! - **`sync_clipboard`** / **`bridge_clipboard`** – Moving text between the
//!   local clipboard and the remote one.
//!
//! - **`deferred`** – Cancellable one-shot timers tied to a session.

pub mod bind_input;
pub mod bridge_clipboard;
pub mod deferred;
pub mod display_session;
pub mod mount_display;
pub mod ports;
pub mod session_machine;
pub mod session_shell;
pub mod sync_clipboard;
