//! Cooperative cancellation for pipeline runs.
//!
//! This module provides:
//! - CancellationToken for cooperative cancellation
//! - Scope, the token plus an optional deadline, carried by each run context

mod scope;
mod token;

pub use scope::Scope;
pub use token::CancellationToken;
