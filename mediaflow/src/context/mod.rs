//! Context management for pipeline runs.
//!
//! This module provides:
//! - The per-run `Context`: parameters, error accumulator and cancellable scope
//! - Tagged context values with checked, typed accessors
//! - Run identity for log correlation

mod accumulator;
#[cfg(test)]
mod context_tests;
mod execution;
mod identity;
mod value;

pub use accumulator::{CommandFailure, ErrorAccumulator, ErrorReport, ErrorReportEntry};
pub use execution::Context;
pub use identity::RunIdentity;
pub use value::{keys, ContextValue, FromContextValue, TypedKey};
