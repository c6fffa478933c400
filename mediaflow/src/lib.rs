//! # Mediaflow
//!
//! A command-pipeline execution engine for media-processing workflows.
//!
//! Mediaflow runs an ordered list of commands against a per-run context:
//!
//! - **Context**: a keyed store for values passed between commands, plus an
//!   error accumulator keyed by command name
//! - **Commands**: uniform units of work that read an input key, perform a
//!   side effect and write an output key or record an error
//! - **Executor**: sequential execution that never aborts on a failed
//!   command; downstream commands see the missing key instead
//! - **Metrics**: per-command success and error counters with an explicit
//!   flush and shutdown lifecycle
//! - **Consistency poller**: bounded waits for objects on an eventually
//!   consistent mount
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mediaflow::prelude::*;
//! use std::sync::Arc;
//!
//! let metrics = MetricsRecorder::new("media", Arc::new(LoggingMetricsSink));
//! let pipeline = PipelineBuilder::new("video-to-transcript")
//!     .seeded_key(keys::INPUT_OBJECT.name())
//!     .command(Arc::new(AudioExtractorCommand::new(
//!         "extract", "ffmpeg", &config.storage, &metrics,
//!     ).with_output_key("audio_uri")))?
//!     .command(Arc::new(AudioTranscriptionCommand::new(
//!         "transcribe", settings, recognizer, &metrics,
//!     ).with_input_key("audio_uri")))?
//!     .build()?;
//!
//! let mut ctx = Context::new();
//! ctx.set_typed(&keys::INPUT_OBJECT, StorageObject::new("uploads", "talk.mp4"));
//! let report = pipeline.run(&mut ctx).await;
//! metrics.shutdown();
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod commands;
pub mod config;
pub mod context;
pub mod errors;
pub mod metrics;
pub mod observability;
pub mod pipeline;
pub mod poller;
pub mod storage;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{CancellationToken, Scope};
    pub use crate::commands::{
        AudioExtractorCommand, AudioTranscriptionCommand, Command, ExternalTool,
        Instrumentation, SharedCommand, SpeechRecognizer, TranscriptionSettings,
        WaitForObjectCommand,
    };
    pub use crate::config::{ApplicationConfig, Config, PollingConfig, StorageConfig};
    pub use crate::context::{keys, Context, ContextValue, ErrorReport, RunIdentity, TypedKey};
    pub use crate::errors::{
        CommandError, ConfigError, MediaflowError, PipelineValidationError,
    };
    pub use crate::metrics::{
        LoggingMetricsSink, MetricsRecorder, MetricsSink, NoOpMetricsSink,
    };
    pub use crate::observability::{init_logging, LogFormat, LoggingConfig};
    pub use crate::pipeline::{CommandOutcome, Pipeline, PipelineBuilder, PipelineReport};
    pub use crate::poller::{ConsistencyPoller, PollReport, PollRequest, PollState};
    pub use crate::storage::StorageObject;
}
