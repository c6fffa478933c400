//! Pipeline building and execution.
//!
//! This module provides:
//! - Pipeline builder with validation
//! - The sequential executor
//! - Per-run execution reports

mod builder;
mod executor;
mod report;

pub use builder::{Pipeline, PipelineBuilder};
pub use executor::run_commands;
pub use report::{CommandOutcome, CommandRecord, PipelineReport};
