//! Service configuration.
//!
//! Configuration is a JSON document, usually stored in a bucket and read
//! through the same mount the commands use. Missing fields take defaults;
//! [`Config::validate`] rejects values the commands cannot work with.

use crate::cancellation::Scope;
use crate::errors::ConfigError;
use crate::observability::LoggingConfig;
use crate::poller::{
    ConsistencyPoller, PollRequest, DEFAULT_FILE_CHECK_DELAY, DEFAULT_FILE_CHECK_RETRIES,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Bucket and mount settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local directory the buckets are mounted under.
    #[serde(default = "default_mount_point")]
    pub gcs_fuse_mount_point: PathBuf,
    /// Bucket receiving extracted audio and transcripts.
    #[serde(default)]
    pub audio_bucket: String,
}

fn default_mount_point() -> PathBuf {
    PathBuf::from("/mnt/gcs")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            gcs_fuse_mount_point: default_mount_point(),
            audio_bucket: String::new(),
        }
    }
}

impl StorageConfig {
    /// Sets the mount point.
    #[must_use]
    pub fn with_mount_point(mut self, path: impl Into<PathBuf>) -> Self {
        self.gcs_fuse_mount_point = path.into();
        self
    }

    /// Sets the audio bucket.
    #[must_use]
    pub fn with_audio_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.audio_bucket = bucket.into();
        self
    }
}

/// Cloud project settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Project the speech API is billed to.
    #[serde(default)]
    pub google_project_id: String,
    /// Region of the speech API.
    #[serde(default = "default_location")]
    pub google_location: String,
}

fn default_location() -> String {
    "us-central1".to_string()
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            google_project_id: String::new(),
            google_location: default_location(),
        }
    }
}

impl ApplicationConfig {
    /// Sets the project id.
    #[must_use]
    pub fn with_project_id(mut self, project: impl Into<String>) -> Self {
        self.google_project_id = project.into();
        self
    }

    /// Sets the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.google_location = location.into();
        self
    }
}

/// Consistency polling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Number of checks per poll.
    #[serde(default = "default_file_check_retries")]
    pub file_check_retries: u32,
    /// Delay between checks in seconds.
    #[serde(default = "default_file_check_delay_secs")]
    pub file_check_delay_secs: u64,
}

fn default_file_check_retries() -> u32 {
    DEFAULT_FILE_CHECK_RETRIES
}

fn default_file_check_delay_secs() -> u64 {
    DEFAULT_FILE_CHECK_DELAY.as_secs()
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            file_check_retries: default_file_check_retries(),
            file_check_delay_secs: default_file_check_delay_secs(),
        }
    }
}

impl PollingConfig {
    /// Returns the delay between checks.
    #[must_use]
    pub fn file_check_delay(&self) -> Duration {
        Duration::from_secs(self.file_check_delay_secs)
    }

    /// Builds a poll request for `path` with these settings.
    #[must_use]
    pub fn request(&self, path: impl Into<PathBuf>) -> PollRequest {
        PollRequest::new(path)
            .with_attempts(self.file_check_retries)
            .with_delay(self.file_check_delay())
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Cloud project settings.
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Polling settings.
    #[serde(default)]
    pub polling: PollingConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Read`, `Parse` or `Invalid`.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_json_str(&raw)?;
        config.validate()?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Waits for a recent refresh of the file at `path`, then loads it.
    ///
    /// A refresh that never shows up on the mount is not an error: the file
    /// currently on disk is loaded instead.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub async fn load_after_refresh(
        path: &Path,
        max_age: Duration,
        poller: &ConsistencyPoller,
        scope: &Scope,
    ) -> Result<Self, ConfigError> {
        let request = PollRequest::new(path).with_max_age(max_age);
        let report = poller.wait_for_file_update(&request, scope).await;
        if !report.is_satisfied() {
            info!(path = %path.display(), state = ?report.state, "Proceeding with existing config");
        }
        Self::load(path).await
    }

    /// Checks that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.gcs_fuse_mount_point.as_os_str().is_empty() {
            return Err(ConfigError::invalid(
                "storage.gcs_fuse_mount_point",
                "must not be empty",
            ));
        }
        if self.storage.audio_bucket.trim().is_empty() {
            return Err(ConfigError::invalid("storage.audio_bucket", "must not be empty"));
        }
        if self.application.google_project_id.trim().is_empty() {
            return Err(ConfigError::invalid(
                "application.google_project_id",
                "must not be empty",
            ));
        }
        if self.application.google_location.trim().is_empty() {
            return Err(ConfigError::invalid(
                "application.google_location",
                "must not be empty",
            ));
        }
        if self.polling.file_check_retries == 0 {
            return Err(ConfigError::invalid(
                "polling.file_check_retries",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
