//! Remote-display adapters.
//!
//! Implementations of the collaborator ports in
//! [`crate::application::ports`].  The remote-display library itself (wire
//! protocol, framebuffer decoding, raw capture) is out of scope for this
//! crate, so the only adapters shipped are the recording doubles in
//! [`mock`].  They double as a loopback backend for the headless binary:
//! a loopback manager walks through `CONNECTING → WAITING → CONNECTED` on
//! `connect()` and `DISCONNECTED` on `disconnect()`.

pub mod mock;
