//! rdshell-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does rdshell do? (for beginners)
//!
//! rdshell is the shell around a remote-desktop session that runs in a
//! browser.  A separate remote manager speaks the actual remote-desktop
//! protocol through a WebSocket tunnel; the shell decides *when* to connect,
//! what to show, and where local input goes:
//!
//! 1. The user presses connect.  The shell opens a tunnel, creates a manager
//!    and subscribes to its events.
//! 2. The manager reports `CONNECTING`, `WAITING`, then `CONNECTED`.  The
//!    shell mounts the remote display, scales it to fit, and shows it.
//! 3. While the display has focus, local mouse and keyboard events are
//!    forwarded to the remote machine and the local clipboard is pushed to
//!    it.  Text the remote side copies is written to the local clipboard.
//! 4. On disconnect or error the display is unmounted, input is released,
//!    and the subscription is dropped before a new connect is accepted.

/// Application layer: state machine, shell, and display use cases.
pub mod application;

/// Infrastructure layer: loopback adapters, runtime, storage, and UI bridge.
pub mod infrastructure;
