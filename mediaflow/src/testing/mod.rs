//! Testing utilities for mediaflow pipelines.
//!
//! This module provides:
//! - Mock commands
//! - A virtual clock and a scripted path probe for poller tests
//! - Assertions over run contexts and counters

mod assertions;
mod mocks;
mod time;

pub use assertions::{
    assert_counters, assert_error_count, assert_error_kind, assert_no_errors, assert_text,
};
pub use mocks::{MockBehavior, MockCommand};
pub use time::{ProbeStep, ScriptedProbe, VirtualClock};
