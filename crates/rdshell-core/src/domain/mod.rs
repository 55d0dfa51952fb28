//! Domain entities for rdshell.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code:
//!
//! - Contains the core rules of the application.
//! - Has **no** imports from async runtimes, DOM bindings, or the remote-display
//!   library.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Code in outer layers (application, infrastructure) depends on the domain,
//! but the domain never depends on them.

pub mod events;
pub mod input;
pub mod params;

/// Display scaling: fitting a remote framebuffer into a local viewport.
///
/// See [`scale::compute_scale`] for the main entry point.
pub mod scale;

pub mod state;
