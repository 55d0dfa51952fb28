//! Storage infrastructure: configuration and screenshot file persistence.
//!
//! - **`config`** reads and writes the TOML configuration file, falling back
//!   to defaults when it does not exist yet.
//! - **`screenshot`** writes captured display images to disk.

pub mod config;
pub mod screenshot;
