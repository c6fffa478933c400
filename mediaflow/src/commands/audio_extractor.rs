//! Audio track extraction from an uploaded video.

use super::{Command, ExternalTool, Instrumentation, DEFAULT_AUDIO_EXTRACT_ARGS};
use crate::config::StorageConfig;
use crate::context::{keys, Context};
use crate::errors::CommandError;
use crate::metrics::MetricsRecorder;
use crate::storage::StorageObject;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Extracts the audio of a video object into the audio bucket.
///
/// Reads a [`StorageObject`] (by default from [`keys::INPUT_OBJECT`]), runs
/// the extraction tool between the two mount paths, and writes the
/// `gs://` URI of the produced audio object. The audio object keeps the video
/// name with `.mp4` replaced by `.wav`.
#[derive(Debug, Clone)]
pub struct AudioExtractorCommand {
    instrumentation: Instrumentation,
    tool: ExternalTool,
    mount_point: PathBuf,
    audio_bucket: String,
}

impl AudioExtractorCommand {
    /// Source suffix replaced in the output name.
    pub const VIDEO_SUFFIX: &'static str = ".mp4";
    /// Suffix of the produced audio object.
    pub const AUDIO_SUFFIX: &'static str = ".wav";

    /// Creates an extractor running `program` with the default arguments.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        storage: &StorageConfig,
        metrics: &MetricsRecorder,
    ) -> Self {
        Self {
            instrumentation: Instrumentation::new(name, metrics)
                .with_input_key(keys::INPUT_OBJECT.name()),
            tool: ExternalTool::new(program, DEFAULT_AUDIO_EXTRACT_ARGS),
            mount_point: storage.gcs_fuse_mount_point.clone(),
            audio_bucket: storage.audio_bucket.clone(),
        }
    }

    /// Reads the video object from `key` instead of [`keys::INPUT_OBJECT`].
    #[must_use]
    pub fn with_input_key(mut self, key: impl Into<String>) -> Self {
        self.instrumentation = self.instrumentation.with_input_key(key);
        self
    }

    /// Sets the key receiving the audio URI.
    #[must_use]
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.instrumentation = self.instrumentation.with_output_key(key);
        self
    }

    /// Replaces the tool invocation.
    #[must_use]
    pub fn with_tool(mut self, tool: ExternalTool) -> Self {
        self.tool = tool;
        self
    }

    async fn extract(&self, ctx: &Context) -> Result<String, CommandError> {
        let video: StorageObject = self.instrumentation.input(ctx)?;
        let audio = video.derive(&self.audio_bucket, Self::VIDEO_SUFFIX, Self::AUDIO_SUFFIX);

        let input = video.mount_path(&self.mount_point);
        let output = audio.mount_path(&self.mount_point);
        self.tool.run(&input, &output, ctx.scope()).await?;

        info!(
            command = %self.instrumentation.name(),
            video = %video,
            audio = %audio,
            "Audio extracted"
        );
        Ok(audio.uri())
    }
}

#[async_trait]
impl Command for AudioExtractorCommand {
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
        let result = self.extract(ctx).await;
        self.instrumentation.finish(ctx, result.map(Into::into));
    }
}
