//! Mock commands for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::commands::{Command, Instrumentation};
use crate::context::{Context, ContextValue};
use crate::errors::CommandError;
use crate::metrics::MetricsRecorder;

/// What a [`MockCommand`] does once its input was read.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Write this value.
    Produce(ContextValue),
    /// Copy the input value to the output key.
    Forward,
    /// Record an `ExternalToolFailure` with this reason.
    Fail(String),
    /// Cancel the run's scope, then succeed.
    CancelRun(String),
}

/// A command driven by a [`MockBehavior`].
///
/// A non-empty input key is read first, so a missing upstream output makes
/// the mock record `MissingKey` like a real command would.
#[derive(Debug)]
pub struct MockCommand {
    instrumentation: Instrumentation,
    behavior: MockBehavior,
    call_count: AtomicUsize,
    log: Option<Arc<Mutex<Vec<String>>>>,
}

impl MockCommand {
    /// Creates a mock with the given behavior and no keys.
    #[must_use]
    pub fn new(name: impl Into<String>, behavior: MockBehavior, metrics: &MetricsRecorder) -> Self {
        Self {
            instrumentation: Instrumentation::new(name, metrics),
            behavior,
            call_count: AtomicUsize::new(0),
            log: None,
        }
    }

    /// A mock writing `value` under `output_key`.
    #[must_use]
    pub fn producing(
        name: impl Into<String>,
        output_key: impl Into<String>,
        value: impl Into<ContextValue>,
        metrics: &MetricsRecorder,
    ) -> Self {
        Self::new(name, MockBehavior::Produce(value.into()), metrics).with_output_key(output_key)
    }

    /// A mock forwarding `input_key` to `output_key`.
    #[must_use]
    pub fn forwarding(
        name: impl Into<String>,
        input_key: impl Into<String>,
        output_key: impl Into<String>,
        metrics: &MetricsRecorder,
    ) -> Self {
        Self::new(name, MockBehavior::Forward, metrics)
            .with_input_key(input_key)
            .with_output_key(output_key)
    }

    /// A mock that always fails.
    #[must_use]
    pub fn failing(
        name: impl Into<String>,
        reason: impl Into<String>,
        metrics: &MetricsRecorder,
    ) -> Self {
        Self::new(name, MockBehavior::Fail(reason.into()), metrics)
    }

    /// Sets the input key.
    #[must_use]
    pub fn with_input_key(mut self, key: impl Into<String>) -> Self {
        self.instrumentation = self.instrumentation.with_input_key(key);
        self
    }

    /// Sets the output key.
    #[must_use]
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.instrumentation = self.instrumentation.with_output_key(key);
        self
    }

    /// Appends the command name to `log` on every execution.
    #[must_use]
    pub fn with_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.log = Some(log);
        self
    }

    /// Returns the number of times the command ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn run(&self, ctx: &Context) -> Result<ContextValue, CommandError> {
        let input = if self.instrumentation.input_key().is_empty() {
            None
        } else {
            Some(ctx.get(self.instrumentation.input_key())?.clone())
        };

        match &self.behavior {
            MockBehavior::Produce(value) => Ok(value.clone()),
            MockBehavior::Forward => Ok(input.unwrap_or_else(|| ContextValue::Text(String::new()))),
            MockBehavior::Fail(reason) => Err(CommandError::external_tool("mock", reason.clone())),
            MockBehavior::CancelRun(reason) => {
                ctx.scope().cancel(reason.clone());
                Ok(ContextValue::Text(reason.clone()))
            }
        }
    }
}

#[async_trait]
impl Command for MockCommand {
    fn name(&self) -> &str {
        self.instrumentation.name()
    }

    fn input_key(&self) -> &str {
        self.instrumentation.input_key()
    }

    fn output_key(&self) -> &str {
        self.instrumentation.output_key()
    }

    async fn execute(&self, ctx: &mut Context) {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().push(self.instrumentation.name().to_string());
        }
        let result = self.run(ctx);
        self.instrumentation.finish(ctx, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NoOpMetricsSink;

    #[tokio::test]
    async fn test_forwarding_reads_input() {
        let metrics = MetricsRecorder::new("test", Arc::new(NoOpMetricsSink));
        let cmd = MockCommand::forwarding("copy", "a", "b", &metrics);
        let mut ctx = Context::new().with_value("a", "x");

        cmd.execute(&mut ctx).await;

        assert_eq!(ctx.get_as::<String>("b").unwrap(), "x");
        assert_eq!(cmd.call_count(), 1);
    }

    #[tokio::test]
    async fn test_forwarding_missing_input() {
        let metrics = MetricsRecorder::new("test", Arc::new(NoOpMetricsSink));
        let cmd = MockCommand::forwarding("copy", "a", "b", &metrics);
        let mut ctx = Context::new();

        cmd.execute(&mut ctx).await;

        assert_eq!(ctx.errors_for("copy")[0].kind(), "MissingKey");
        assert!(!ctx.contains_key("b"));
    }

    #[tokio::test]
    async fn test_cancel_run() {
        let metrics = MetricsRecorder::new("test", Arc::new(NoOpMetricsSink));
        let cmd = MockCommand::new("abort", MockBehavior::CancelRun("stop".to_string()), &metrics);
        let mut ctx = Context::new();

        cmd.execute(&mut ctx).await;

        assert!(ctx.scope().is_cancelled());
    }
}
