//! Identity, keys and counters shared by every command.

use crate::context::{Context, ContextValue, FromContextValue};
use crate::errors::CommandError;
use crate::metrics::{CommandCounters, MetricsRecorder};
use tracing::{debug, warn};

/// The name, keys and counters a command holds by composition.
///
/// [`Instrumentation::finish`] applies the command contract: write the output
/// and count a success, or record the error and count a failure.
#[derive(Debug, Clone)]
pub struct Instrumentation {
    name: String,
    input_key: String,
    output_key: String,
    counters: CommandCounters,
}

impl Instrumentation {
    /// Creates the instrumentation for `name`, registering its counters.
    #[must_use]
    pub fn new(name: impl Into<String>, metrics: &MetricsRecorder) -> Self {
        let name = name.into();
        let counters = metrics.command_counters(&name);
        Self {
            name,
            input_key: String::new(),
            output_key: String::new(),
            counters,
        }
    }

    /// Sets the input key.
    #[must_use]
    pub fn with_input_key(mut self, key: impl Into<String>) -> Self {
        self.input_key = key.into();
        self
    }

    /// Sets the output key.
    #[must_use]
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = key.into();
        self
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the input key.
    #[must_use]
    pub fn input_key(&self) -> &str {
        &self.input_key
    }

    /// Returns the output key.
    #[must_use]
    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    /// Returns the command's counters.
    #[must_use]
    pub fn counters(&self) -> &CommandCounters {
        &self.counters
    }

    /// Reads the input key as `T`.
    ///
    /// # Errors
    ///
    /// `MissingKey` or `TypeMismatch`, as returned by [`Context::get_as`].
    pub fn input<T: FromContextValue>(&self, ctx: &Context) -> Result<T, CommandError> {
        ctx.get_as(&self.input_key)
    }

    /// Records the outcome of one execution. Returns true on success.
    pub fn finish(&self, ctx: &mut Context, result: Result<ContextValue, CommandError>) -> bool {
        match result {
            Ok(value) => {
                if !self.output_key.is_empty() {
                    ctx.set(self.output_key.clone(), value);
                }
                self.counters.success.add(1);
                debug!(command = %self.name, output_key = %self.output_key, "Command succeeded");
                true
            }
            Err(err) => {
                self.fail(ctx, err);
                false
            }
        }
    }

    /// Records `err` against the command and counts a failure.
    pub fn fail(&self, ctx: &mut Context, err: CommandError) {
        warn!(
            command = %self.name,
            kind = err.kind(),
            error = %err.chain(),
            run_id = %ctx.run_identity().pipeline_run_id,
            "Command failed"
        );
        ctx.add_error(self.name.clone(), err);
        self.counters.error.add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NoOpMetricsSink;
    use std::sync::Arc;

    fn recorder() -> MetricsRecorder {
        MetricsRecorder::new("test", Arc::new(NoOpMetricsSink))
    }

    #[test]
    fn test_finish_success_writes_output() {
        let metrics = recorder();
        let instr = Instrumentation::new("extract", &metrics).with_output_key("audio_uri");
        let mut ctx = Context::new();

        assert!(instr.finish(&mut ctx, Ok("gs://audio/a.wav".into())));

        assert_eq!(ctx.get_as::<String>("audio_uri").unwrap(), "gs://audio/a.wav");
        assert_eq!(instr.counters().success.value(), 1);
        assert_eq!(instr.counters().error.value(), 0);
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_finish_failure_records_error() {
        let metrics = recorder();
        let instr = Instrumentation::new("extract", &metrics).with_output_key("audio_uri");
        let mut ctx = Context::new();

        assert!(!instr.finish(&mut ctx, Err(CommandError::external_tool("ffmpeg", "exit status: 1"))));

        assert!(!ctx.contains_key("audio_uri"));
        assert_eq!(ctx.errors_for("extract").len(), 1);
        assert_eq!(instr.counters().error.value(), 1);
        assert_eq!(instr.counters().success.value(), 0);
    }

    #[test]
    fn test_empty_output_key_writes_nothing() {
        let metrics = recorder();
        let instr = Instrumentation::new("notify", &metrics);
        let mut ctx = Context::new();

        assert!(instr.finish(&mut ctx, Ok("ignored".into())));
        assert!(ctx.keys().is_empty());
    }

    #[test]
    fn test_input_missing() {
        let metrics = recorder();
        let instr = Instrumentation::new("transcribe", &metrics).with_input_key("audio_uri");
        let err = instr.input::<String>(&Context::new()).unwrap_err();
        assert_eq!(err.kind(), "MissingKey");
    }

    #[test]
    fn test_same_name_shares_counters() {
        let metrics = recorder();
        let a = Instrumentation::new("extract", &metrics);
        let b = Instrumentation::new("extract", &metrics);

        a.counters().success.add(1);
        assert_eq!(b.counters().success.value(), 1);
    }
}
