//! Invocation of local binaries with `{input}` / `{output}` substitution.

use crate::cancellation::Scope;
use crate::errors::CommandError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Arguments extracting a mono audio track at best quality.
pub const DEFAULT_AUDIO_EXTRACT_ARGS: &str = "-i {input} -q:a 0 -map a -ac 1 {output}";

/// A local program and its argument template.
///
/// Each argument may contain `{input}` and `{output}`, replaced by the paths
/// given to [`ExternalTool::run`]. Standard error is inherited so the tool's
/// diagnostics reach the service log. The child is killed if the run's scope
/// is cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTool {
    program: String,
    args: Vec<String>,
}

impl ExternalTool {
    /// Creates a tool from a whitespace-separated argument template.
    #[must_use]
    pub fn new(program: impl Into<String>, template: &str) -> Self {
        Self {
            program: program.into(),
            args: template.split_whitespace().map(String::from).collect(),
        }
    }

    /// Creates a tool from an explicit argument list.
    #[must_use]
    pub fn with_args(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Returns the program path.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments with placeholders substituted.
    #[must_use]
    pub fn render_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }

    /// Runs the tool to completion.
    ///
    /// # Errors
    ///
    /// - `ExternalToolFailure` if the process cannot be launched or exits
    ///   unsuccessfully.
    /// - `Cancelled` if the scope is cancelled before or during the run.
    pub async fn run(&self, input: &Path, output: &Path, scope: &Scope) -> Result<(), CommandError> {
        if scope.is_cancelled() {
            return Err(cancelled(scope));
        }

        let args = self.render_args(input, output);
        info!(program = %self.program, args = ?args, "Running external tool");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::tool_launch(&self.program, e))?;

        let waited = scope.run_until_cancelled(child.wait()).await;

        let Some(status) = waited else {
            if let Err(e) = child.kill().await {
                debug!(program = %self.program, error = %e, "Failed to kill cancelled tool");
            }
            return Err(cancelled(scope));
        };

        let status = status.map_err(|e| CommandError::ExternalToolFailure {
            program: self.program.clone(),
            reason: "failed to wait on process".to_string(),
            source: Some(e),
        })?;
        if status.success() {
            debug!(program = %self.program, "External tool finished");
            Ok(())
        } else {
            Err(CommandError::external_tool(&self.program, format!("exited with {status}")))
        }
    }
}

fn cancelled(scope: &Scope) -> CommandError {
    CommandError::cancelled(scope.reason().unwrap_or_else(|| "cancelled".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_render_default_template() {
        let tool = ExternalTool::new("ffmpeg", DEFAULT_AUDIO_EXTRACT_ARGS);
        let args = tool.render_args(
            &PathBuf::from("/mnt/raw/video.mp4"),
            &PathBuf::from("/mnt/audio/video.wav"),
        );

        assert_eq!(
            args,
            vec![
                "-i",
                "/mnt/raw/video.mp4",
                "-q:a",
                "0",
                "-map",
                "a",
                "-ac",
                "1",
                "/mnt/audio/video.wav",
            ]
        );
    }

    #[test]
    fn test_render_embedded_placeholder() {
        let tool = ExternalTool::with_args("sox", vec!["--out={output}".to_string()]);
        let args = tool.render_args(Path::new("in"), Path::new("out.wav"));
        assert_eq!(args, vec!["--out=out.wav"]);
    }

    #[tokio::test]
    async fn test_launch_failure() {
        let tool = ExternalTool::new("nonexistent_tool_xyz_12345", "{input}");
        let err = tool
            .run(Path::new("a"), Path::new("b"), &Scope::new())
            .await
            .unwrap_err();

        match err {
            CommandError::ExternalToolFailure { program, source, .. } => {
                assert_eq!(program, "nonexistent_tool_xyz_12345");
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_scope_skips_launch() {
        let scope = Scope::new();
        scope.cancel("operator abort");

        let tool = ExternalTool::new("nonexistent_tool_xyz_12345", "");
        let err = tool.run(Path::new("a"), Path::new("b"), &scope).await.unwrap_err();
        assert_eq!(err.kind(), "Cancelled");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status() {
        let scope = Scope::new();
        assert_ok!(
            ExternalTool::new("true", "")
                .run(Path::new("a"), Path::new("b"), &scope)
                .await
        );

        let err = assert_err!(
            ExternalTool::new("false", "")
                .run(Path::new("a"), Path::new("b"), &scope)
                .await
        );
        assert_eq!(err.kind(), "ExternalToolFailure");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_running_tool() {
        let scope = Scope::new();
        let handle = scope.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.cancel("deadline");
        });

        let tool = ExternalTool::new("sleep", "30");
        let err = tokio::time::timeout(
            Duration::from_secs(10),
            tool.run(Path::new("a"), Path::new("b"), &scope),
        )
        .await
        .unwrap()
        .unwrap_err();

        assert!(matches!(err, CommandError::Cancelled { ref reason } if reason == "deadline"));
    }
}
