//! Pipeline builder with validation.

use super::{run_commands, PipelineReport};
use crate::commands::SharedCommand;
use crate::context::Context;
use crate::errors::PipelineValidationError;
use std::collections::HashSet;
use tracing::warn;

/// An ordered, validated list of commands.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    commands: Vec<SharedCommand>,
}

impl Pipeline {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if the pipeline has no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the command names in execution order.
    #[must_use]
    pub fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// Runs every command against `ctx`.
    pub async fn run(&self, ctx: &mut Context) -> PipelineReport {
        run_commands(&self.name, &self.commands, ctx).await
    }
}

/// Builder for creating validated pipelines.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    commands: Vec<SharedCommand>,
    seeded_keys: HashSet<String>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            seeded_keys: HashSet::new(),
        }
    }

    /// Declares a key the caller writes into the context before the run.
    #[must_use]
    pub fn seeded_key(mut self, key: impl Into<String>) -> Self {
        self.seeded_keys.insert(key.into());
        self
    }

    /// Appends a command.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or already used.
    pub fn command(mut self, command: SharedCommand) -> Result<Self, PipelineValidationError> {
        let name = command.name();
        if name.trim().is_empty() {
            return Err(
                PipelineValidationError::new("PIPELINE-002-EMPTY_NAME", "Command name is empty")
                    .with_fix_hint("Give every command a unique, non-empty name."),
            );
        }
        if self.commands.iter().any(|c| c.name() == name) {
            return Err(PipelineValidationError::new(
                "PIPELINE-003-DUPLICATE",
                format!("Command '{name}' is already part of pipeline '{}'", self.name),
            )
            .with_commands(vec![name.to_string()])
            .with_fix_hint(
                "Command names key the error accumulator and the counters; rename one of them.",
            ));
        }

        self.commands.push(command);
        Ok(self)
    }

    /// Returns input keys that no earlier command writes and nobody seeds,
    /// as `(command, key)` pairs.
    #[must_use]
    pub fn unproduced_inputs(&self) -> Vec<(String, String)> {
        let mut available: HashSet<&str> = self.seeded_keys.iter().map(String::as_str).collect();
        let mut missing = Vec::new();

        for command in &self.commands {
            let input = command.input_key();
            if !input.is_empty() && !available.contains(input) {
                missing.push((command.name().to_string(), input.to_string()));
            }
            if !command.output_key().is_empty() {
                available.insert(command.output_key());
            }
        }

        missing
    }

    /// Builds the pipeline.
    ///
    /// Inputs no earlier command produces are only logged: the caller may
    /// seed them at run time.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder has no commands.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.commands.is_empty() {
            return Err(
                PipelineValidationError::new("PIPELINE-001-EMPTY", "Pipeline has no commands")
                    .with_fix_hint("Add at least one command to the pipeline before building."),
            );
        }

        for (command, key) in self.unproduced_inputs() {
            warn!(
                pipeline = %self.name,
                command = %command,
                key = %key,
                "Input key is not produced by an earlier command"
            );
        }

        Ok(Pipeline {
            name: self.name,
            commands: self.commands,
        })
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of commands.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricsRecorder, NoOpMetricsSink};
    use crate::testing::MockCommand;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn metrics() -> MetricsRecorder {
        MetricsRecorder::new("test", Arc::new(NoOpMetricsSink))
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = PipelineBuilder::new("media").build().unwrap_err();
        assert_eq!(err.code, "PIPELINE-001-EMPTY");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let metrics = metrics();
        let err = PipelineBuilder::new("media")
            .command(Arc::new(MockCommand::producing("extract", "a", "x", &metrics)))
            .unwrap()
            .command(Arc::new(MockCommand::producing("extract", "b", "y", &metrics)))
            .unwrap_err();

        assert_eq!(err.code, "PIPELINE-003-DUPLICATE");
        assert_eq!(err.commands, vec!["extract".to_string()]);
        assert!(err.fix_hint.is_some());
    }

    #[test]
    fn test_empty_name_rejected() {
        let metrics = metrics();
        let err = PipelineBuilder::new("media")
            .command(Arc::new(MockCommand::producing("", "a", "x", &metrics)))
            .unwrap_err();
        assert_eq!(err.code, "PIPELINE-002-EMPTY_NAME");
    }

    #[test]
    fn test_unproduced_inputs() {
        let metrics = metrics();
        let builder = PipelineBuilder::new("media")
            .seeded_key("video")
            .command(Arc::new(MockCommand::forwarding("extract", "video", "audio", &metrics)))
            .unwrap()
            .command(Arc::new(MockCommand::forwarding("transcribe", "audio", "srt", &metrics)))
            .unwrap()
            .command(Arc::new(MockCommand::forwarding("index", "captions", "doc", &metrics)))
            .unwrap();

        assert_eq!(
            builder.unproduced_inputs(),
            vec![("index".to_string(), "captions".to_string())]
        );

        let pipeline = builder.build().unwrap();
        assert_eq!(pipeline.command_names(), vec!["extract", "transcribe", "index"]);
        assert_eq!(pipeline.len(), 3);
    }
}
