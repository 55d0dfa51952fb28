//! Infrastructure layer for the session shell.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `rdshell_core`, but MUST NOT be imported by the `application` or domain
//! layers.
//!
//! # Sub-modules
//!
//! - **`remote`** – Loopback implementations of the remote-desktop ports
//!   (tunnel, manager, display, input capture, containers, fullscreen).
//!   Used by tests and by the `rdshell` binary's offline mode.
//!
//! - **`clipboard`** – In-memory system clipboard and scratch document.
//!
//! - **`runtime`** – Spawns the shell loop and hands out a cloneable
//!   [`runtime::ShellHandle`].
//!
//! - **`storage`** – TOML configuration and screenshot files.
//!
//! - **`ui_bridge`** – Command handlers that expose shell state to a UI.

pub mod clipboard;
pub mod remote;
pub mod runtime;
pub mod storage;
pub mod ui_bridge;
