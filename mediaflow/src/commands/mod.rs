//! Command trait and the reference media commands.
//!
//! Commands are the units of work of a pipeline. Each one reads its input
//! from the shared [`Context`], performs one side effect, and either writes
//! its output key or records an error against its own name. A command never
//! returns an error to the executor.

mod audio_extractor;
mod external;
mod instrumentation;
mod transcription;
mod wait_for_object;

pub use audio_extractor::AudioExtractorCommand;
pub use external::{ExternalTool, DEFAULT_AUDIO_EXTRACT_ARGS};
pub use instrumentation::Instrumentation;
pub use transcription::{
    AudioTranscriptionCommand, RecognitionFeatures, RecognitionJob, RecognitionRequest,
    RecognitionResponse, SpeechRecognizer, TranscriptionOutcome, TranscriptionSettings,
};
pub use wait_for_object::WaitForObjectCommand;

#[cfg(test)]
pub use transcription::MockSpeechRecognizer;

use crate::context::Context;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Trait for pipeline commands.
///
/// `name` is unique within a pipeline: it labels the command's counters and
/// keys its entries in the error accumulator. An empty `input_key` or
/// `output_key` means the command has none.
#[async_trait]
pub trait Command: Send + Sync + Debug {
    /// Returns the name of the command.
    fn name(&self) -> &str;

    /// Returns the context key the command reads.
    fn input_key(&self) -> &str;

    /// Returns the context key the command writes on success.
    fn output_key(&self) -> &str;

    /// Executes the command against the run's context.
    ///
    /// On success the output is written under [`Command::output_key`] and the
    /// success counter is incremented. On failure an error is appended under
    /// [`Command::name`], the error counter is incremented, and the output key
    /// is left untouched.
    async fn execute(&self, ctx: &mut Context);
}

/// A shareable command handle.
pub type SharedCommand = Arc<dyn Command>;
