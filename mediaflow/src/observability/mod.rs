//! Observability utilities.
//!
//! Commands and the executor log through `tracing` with structured fields.
//! [`init_logging`] installs the process-wide subscriber that renders them.

mod logging;

pub use logging::{init_logging, LogFormat, LoggingConfig, DEFAULT_LOG_FILTER};
