//! Batch speech-to-text transcription of an audio object.

use super::{Command, Instrumentation};
use crate::config::Config;
use crate::context::{keys, Context};
use crate::errors::{BoxError, CommandError, RemotePhase};
use crate::metrics::MetricsRecorder;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Recognition options applied to every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionFeatures {
    /// Emit per-word start and end offsets.
    pub word_time_offsets: bool,
    /// Insert punctuation.
    pub automatic_punctuation: bool,
}

impl Default for RecognitionFeatures {
    fn default() -> Self {
        Self {
            word_time_offsets: true,
            automatic_punctuation: true,
        }
    }
}

/// Project, model and output settings of the transcription command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    /// Project the API is called for.
    pub project_id: String,
    /// API region.
    pub location: String,
    /// Bucket receiving the transcripts.
    pub output_bucket: String,
    /// Recognition model.
    pub model: String,
    /// Spoken languages.
    pub language_codes: Vec<String>,
    /// Recognition options.
    pub features: RecognitionFeatures,
}

impl TranscriptionSettings {
    /// Default recognition model.
    pub const DEFAULT_MODEL: &'static str = "chirp_2";
    /// Default spoken language.
    pub const DEFAULT_LANGUAGE: &'static str = "en-US";

    /// Creates settings with the default model and language.
    #[must_use]
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        output_bucket: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            output_bucket: output_bucket.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            language_codes: vec![Self::DEFAULT_LANGUAGE.to_string()],
            features: RecognitionFeatures::default(),
        }
    }

    /// Derives the settings from the service configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.application.google_project_id,
            &config.application.google_location,
            &config.storage.audio_bucket,
        )
    }

    /// Sets the recognition model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Returns the recognizer resource name.
    #[must_use]
    pub fn recognizer(&self) -> String {
        format!(
            "projects/{}/locations/{}/recognizers/_",
            self.project_id, self.location
        )
    }

    /// Returns the regional API endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}-speech.googleapis.com", self.location)
    }

    /// Returns the transcript destination.
    #[must_use]
    pub fn output_uri(&self) -> String {
        format!("gs://{}", self.output_bucket)
    }

    /// Builds the batch request for one audio URI.
    #[must_use]
    pub fn request_for(&self, audio_uri: &str) -> RecognitionRequest {
        RecognitionRequest {
            recognizer: self.recognizer(),
            model: self.model.clone(),
            language_codes: self.language_codes.clone(),
            features: self.features,
            files: vec![audio_uri.to_string()],
            output_uri: self.output_uri(),
        }
    }
}

/// A batch recognition request writing SRT transcripts to a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionRequest {
    /// Recognizer resource name.
    pub recognizer: String,
    /// Recognition model.
    pub model: String,
    /// Spoken languages.
    pub language_codes: Vec<String>,
    /// Recognition options.
    pub features: RecognitionFeatures,
    /// Audio URIs to transcribe.
    pub files: Vec<String>,
    /// Transcript destination.
    pub output_uri: String,
}

/// Handle to a submitted long-running recognition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionJob {
    /// Operation name.
    pub name: String,
}

/// What the service reported for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranscriptionOutcome {
    /// The transcript was written.
    Completed {
        /// URI of the SRT transcript.
        srt_uri: String,
    },
    /// The file could not be transcribed.
    Failed {
        /// Reported error.
        message: String,
    },
}

/// Completed recognition, keyed by input URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResponse {
    /// Per-file outcomes.
    pub results: HashMap<String, TranscriptionOutcome>,
}

/// Client of a batch speech recognition service.
///
/// Implementations own transport and authentication. Errors returned here
/// are submission or transport failures; per-file failures are reported in
/// the [`RecognitionResponse`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Submits a batch recognition.
    async fn submit(&self, request: RecognitionRequest) -> Result<RecognitionJob, BoxError>;

    /// Waits for a submitted recognition to complete.
    async fn wait(&self, job: RecognitionJob) -> Result<RecognitionResponse, BoxError>;
}

/// Transcribes the audio URI found under the input key.
///
/// On success the SRT transcript URI is written both to the output key and
/// to [`keys::CTX_OUT`].
#[derive(Clone)]
pub struct AudioTranscriptionCommand {
    instrumentation: Instrumentation,
    settings: TranscriptionSettings,
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl AudioTranscriptionCommand {
    /// Creates the command.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        settings: TranscriptionSettings,
        recognizer: Arc<dyn SpeechRecognizer>,
        metrics: &MetricsRecorder,
    ) -> Self {
        Self {
            instrumentation: Instrumentation::new(name, metrics),
            settings,
            recognizer,
        }
    }

    /// Sets the key holding the audio URI.
    #[must_use]
    pub fn with_input_key(mut self, key: impl Into<String>) -> Self {
        self.instrumentation = self.instrumentation.with_input_key(key);
        self
    }

    /// Sets the key receiving the transcript URI.
    #[must_use]
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.instrumentation = self.instrumentation.with_output_key(key);
        self
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &TranscriptionSettings {
        &self.settings
    }

    async fn transcribe(&self, ctx: &Context) -> Result<String, CommandError> {
        let audio_uri: String = self.instrumentation.input(ctx)?;
        let scope = ctx.scope();
        if scope.is_cancelled() {
            return Err(cancelled(ctx));
        }
        let request = self.settings.request_for(&audio_uri);

        let job = scope
            .run_until_cancelled(self.recognizer.submit(request))
            .await
            .ok_or_else(|| cancelled(ctx))?
            .map_err(|e| CommandError::remote_call(RemotePhase::Submit, e))?;
        info!(
            command = %self.instrumentation.name(),
            job = %job.name,
            audio = %audio_uri,
            "Recognition submitted"
        );

        let mut response = scope
            .run_until_cancelled(self.recognizer.wait(job))
            .await
            .ok_or_else(|| cancelled(ctx))?
            .map_err(|e| CommandError::remote_call(RemotePhase::Wait, e))?;

        match response.results.remove(&audio_uri) {
            Some(TranscriptionOutcome::Completed { srt_uri }) => Ok(srt_uri),
            Some(TranscriptionOutcome::Failed { message }) => {
                Err(CommandError::remote_operation(audio_uri, message))
            }
            None => Err(CommandError::remote_operation(
                audio_uri,
                "no result found for file",
            )),
        }
    }
}

fn cancelled(ctx: &Context) -> CommandError {
    CommandError::cancelled(ctx.scope().reason().unwrap_or_else(|| "cancelled".to_string()))
}

impl fmt::Debug for AudioTranscriptionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioTranscriptionCommand")
            .field("instrumentation", &self.instrumentation)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Command for AudioTranscriptionCommand {
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
        match self.transcribe(ctx).await {
            Ok(srt_uri) => {
                info!(
                    command = %self.instrumentation.name(),
                    transcript = %srt_uri,
                    "Transcription result written"
                );
                ctx.set_typed(&keys::CTX_OUT, srt_uri.clone());
                self.instrumentation.finish(ctx, Ok(srt_uri.into()));
            }
            Err(err) => self.instrumentation.fail(ctx, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NoOpMetricsSink;
    use mockall::predicate::function;
    use pretty_assertions::assert_eq;

    const AUDIO: &str = "gs://audio/video.wav";

    fn settings() -> TranscriptionSettings {
        TranscriptionSettings::new("media-prod", "us-central1", "audio")
    }

    fn command(recognizer: MockSpeechRecognizer, metrics: &MetricsRecorder) -> AudioTranscriptionCommand {
        AudioTranscriptionCommand::new("transcribe", settings(), Arc::new(recognizer), metrics)
            .with_input_key("audio_uri")
            .with_output_key("transcript_uri")
    }

    fn job() -> RecognitionJob {
        RecognitionJob {
            name: "operations/42".to_string(),
        }
    }

    fn response(outcome: TranscriptionOutcome) -> RecognitionResponse {
        RecognitionResponse {
            results: HashMap::from([(AUDIO.to_string(), outcome)]),
        }
    }

    fn metrics() -> MetricsRecorder {
        MetricsRecorder::new("test", Arc::new(NoOpMetricsSink))
    }

    #[test]
    fn test_request_shape() {
        let request = settings().request_for(AUDIO);

        assert_eq!(request.recognizer, "projects/media-prod/locations/us-central1/recognizers/_");
        assert_eq!(request.model, "chirp_2");
        assert_eq!(request.language_codes, vec!["en-US".to_string()]);
        assert!(request.features.word_time_offsets);
        assert!(request.features.automatic_punctuation);
        assert_eq!(request.files, vec![AUDIO.to_string()]);
        assert_eq!(request.output_uri, "gs://audio");
        assert_eq!(settings().endpoint(), "us-central1-speech.googleapis.com");
    }

    #[tokio::test]
    async fn test_success_writes_output_and_ctx_out() {
        let mut recognizer = MockSpeechRecognizer::new();
        recognizer
            .expect_submit()
            .with(function(|r: &RecognitionRequest| r.files == vec![AUDIO.to_string()]))
            .times(1)
            .returning(|_| Ok(job()));
        recognizer.expect_wait().times(1).returning(|_| {
            Ok(response(TranscriptionOutcome::Completed {
                srt_uri: "gs://audio/video.srt".to_string(),
            }))
        });

        let metrics = metrics();
        let cmd = command(recognizer, &metrics);
        let mut ctx = Context::new().with_value("audio_uri", AUDIO);

        cmd.execute(&mut ctx).await;

        assert!(!ctx.has_errors());
        assert_eq!(ctx.get_as::<String>("transcript_uri").unwrap(), "gs://audio/video.srt");
        assert_eq!(ctx.output(), Some("gs://audio/video.srt"));
        assert_eq!(metrics.command_counters("transcribe").success.value(), 1);
    }

    #[tokio::test]
    async fn test_submit_failure() {
        let mut recognizer = MockSpeechRecognizer::new();
        recognizer
            .expect_submit()
            .returning(|_| Err("permission denied".into()));
        recognizer.expect_wait().never();

        let metrics = metrics();
        let cmd = command(recognizer, &metrics);
        let mut ctx = Context::new().with_value("audio_uri", AUDIO);

        cmd.execute(&mut ctx).await;

        let errors = ctx.errors_for("transcribe");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            CommandError::RemoteCallFailure { phase: RemotePhase::Submit, .. }
        ));
        assert!(ctx.output().is_none());
        assert_eq!(metrics.command_counters("transcribe").error.value(), 1);
    }

    #[tokio::test]
    async fn test_wait_failure() {
        let mut recognizer = MockSpeechRecognizer::new();
        recognizer.expect_submit().returning(|_| Ok(job()));
        recognizer
            .expect_wait()
            .returning(|_| Err("operation aborted".into()));

        let metrics = metrics();
        let cmd = command(recognizer, &metrics);
        let mut ctx = Context::new().with_value("audio_uri", AUDIO);

        cmd.execute(&mut ctx).await;

        assert!(matches!(
            ctx.errors_for("transcribe")[0],
            CommandError::RemoteCallFailure { phase: RemotePhase::Wait, .. }
        ));
    }

    #[tokio::test]
    async fn test_no_result_for_file() {
        let mut recognizer = MockSpeechRecognizer::new();
        recognizer.expect_submit().returning(|_| Ok(job()));
        recognizer
            .expect_wait()
            .returning(|_| Ok(RecognitionResponse::default()));

        let metrics = metrics();
        let cmd = command(recognizer, &metrics);
        let mut ctx = Context::new().with_value("audio_uri", AUDIO);

        cmd.execute(&mut ctx).await;

        match ctx.errors_for("transcribe")[0] {
            CommandError::RemoteOperationFailure { item, reason } => {
                assert_eq!(item, AUDIO);
                assert_eq!(reason, "no result found for file");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_per_file_error() {
        let mut recognizer = MockSpeechRecognizer::new();
        recognizer.expect_submit().returning(|_| Ok(job()));
        recognizer.expect_wait().returning(|_| {
            Ok(response(TranscriptionOutcome::Failed {
                message: "unsupported encoding".to_string(),
            }))
        });

        let metrics = metrics();
        let cmd = command(recognizer, &metrics);
        let mut ctx = Context::new().with_value("audio_uri", AUDIO);

        cmd.execute(&mut ctx).await;

        assert_eq!(ctx.errors_for("transcribe")[0].kind(), "RemoteOperationFailure");
        assert!(!ctx.contains_key("transcript_uri"));
    }

    #[tokio::test]
    async fn test_missing_input_never_calls_service() {
        let mut recognizer = MockSpeechRecognizer::new();
        recognizer.expect_submit().never();

        let metrics = metrics();
        let cmd = command(recognizer, &metrics);
        let mut ctx = Context::new();

        cmd.execute(&mut ctx).await;

        assert_eq!(ctx.errors_for("transcribe")[0].kind(), "MissingKey");
    }

    #[tokio::test]
    async fn test_cancelled_scope_abandons_call() {
        let mut recognizer = MockSpeechRecognizer::new();
        recognizer.expect_submit().never();
        recognizer.expect_wait().never();

        let metrics = metrics();
        let cmd = command(recognizer, &metrics);
        let scope = crate::cancellation::Scope::new();
        scope.cancel("deadline");
        let mut ctx = Context::new()
            .with_scope(scope)
            .with_value("audio_uri", AUDIO);

        cmd.execute(&mut ctx).await;

        assert_eq!(ctx.errors_for("transcribe")[0].kind(), "Cancelled");
    }
}
