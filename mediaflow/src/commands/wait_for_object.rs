//! Waiting for an upstream object to show up on the mount.

use super::{Command, Instrumentation};
use crate::config::{PollingConfig, StorageConfig};
use crate::context::{Context, ContextValue};
use crate::errors::CommandError;
use crate::metrics::MetricsRecorder;
use crate::poller::ConsistencyPoller;
use crate::storage::StorageObject;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Polls the mount until the object under the input key is visible.
///
/// The input holds a `gs://` URI or a [`StorageObject`]. Once the object's
/// mount path exists, its URI is written to the output key, so downstream
/// commands reading that key only run on visible objects.
#[derive(Debug, Clone)]
pub struct WaitForObjectCommand {
    instrumentation: Instrumentation,
    poller: ConsistencyPoller,
    mount_point: PathBuf,
    polling: PollingConfig,
}

impl WaitForObjectCommand {
    /// Creates the command.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        storage: &StorageConfig,
        polling: PollingConfig,
        poller: ConsistencyPoller,
        metrics: &MetricsRecorder,
    ) -> Self {
        Self {
            instrumentation: Instrumentation::new(name, metrics),
            poller,
            mount_point: storage.gcs_fuse_mount_point.clone(),
            polling,
        }
    }

    /// Sets the key holding the object.
    #[must_use]
    pub fn with_input_key(mut self, key: impl Into<String>) -> Self {
        self.instrumentation = self.instrumentation.with_input_key(key);
        self
    }

    /// Sets the key receiving the confirmed URI.
    #[must_use]
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.instrumentation = self.instrumentation.with_output_key(key);
        self
    }

    fn object(&self, ctx: &Context) -> Result<StorageObject, CommandError> {
        let key = self.instrumentation.input_key();
        match ctx.get(key)? {
            ContextValue::Object(object) => Ok(object.clone()),
            ContextValue::Text(uri) => StorageObject::parse_uri(uri)
                .ok_or_else(|| CommandError::invalid_input(key, format!("'{uri}' is not a gs:// URI"))),
            other => Err(CommandError::TypeMismatch {
                key: key.to_string(),
                expected: "text or storage object",
                found: other.type_name(),
            }),
        }
    }

    async fn wait(&self, ctx: &Context) -> Result<String, CommandError> {
        let object = self.object(ctx)?;
        let request = self.polling.request(object.mount_path(&self.mount_point));
        let report = self.poller.wait_for_file(&request, ctx.scope()).await?;

        info!(
            command = %self.instrumentation.name(),
            object = %object,
            attempts = report.attempts,
            "Object visible on mount"
        );
        Ok(object.uri())
    }
}

#[async_trait]
impl Command for WaitForObjectCommand {
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
        let result = self.wait(ctx).await;
        self.instrumentation.finish(ctx, result.map(Into::into));
    }
}
