//! Local clipboard adapters.
//!
//! The bridge logic lives in [`crate::application::bridge_clipboard`]; this
//! module supplies implementations of its two ports.  Only in-memory
//! implementations ship here: the headless binary and the test suite both
//! run against [`mock::MockSystemClipboard`] and
//! [`mock::MockScratchDocument`].

pub mod mock;
