//! Per-run error accumulator.

use crate::errors::CommandError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// One failure recorded against a command.
#[derive(Debug)]
pub struct CommandFailure {
    /// Name of the command that recorded the failure.
    pub command: String,
    /// The failure.
    pub error: CommandError,
    /// When it was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Ordered log of command failures for one run.
///
/// Entries are never overwritten. Several commands may contribute, and one
/// command may record more than one error.
#[derive(Debug, Default)]
pub struct ErrorAccumulator {
    entries: Vec<CommandFailure>,
}

impl ErrorAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a failure for `command`.
    pub fn push(&mut self, command: impl Into<String>, error: CommandError) {
        self.entries.push(CommandFailure {
            command: command.into(),
            error,
            recorded_at: Utc::now(),
        });
    }

    /// Returns the total number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over failures in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandFailure> {
        self.entries.iter()
    }

    /// Returns the errors recorded by `command`, oldest first.
    #[must_use]
    pub fn for_command(&self, command: &str) -> Vec<&CommandError> {
        self.entries
            .iter()
            .filter(|f| f.command == command)
            .map(|f| &f.error)
            .collect()
    }

    /// Returns the names of commands with errors, in order of their first failure.
    #[must_use]
    pub fn commands(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for failure in &self.entries {
            if !seen.contains(&failure.command.as_str()) {
                seen.push(&failure.command);
            }
        }
        seen
    }

    /// Builds an operator-facing report of every recorded failure.
    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            entries: self
                .entries
                .iter()
                .map(|f| ErrorReportEntry {
                    command: f.command.clone(),
                    kind: f.error.kind(),
                    message: f.error.chain(),
                    recorded_at: f.recorded_at,
                })
                .collect(),
        }
    }
}

/// A single line of an [`ErrorReport`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReportEntry {
    /// Command name.
    pub command: String,
    /// Error taxonomy name.
    pub kind: &'static str,
    /// The error and its cause chain.
    pub message: String,
    /// When it was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Serializable view of the accumulated failures of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorReport {
    /// Entries in recording order.
    pub entries: Vec<ErrorReportEntry>,
}

impl ErrorReport {
    /// Returns true if the report has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} [{}]: {}", entry.command, entry.kind, entry.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_preserves_order() {
        let mut acc = ErrorAccumulator::new();
        acc.push("extract", CommandError::external_tool("ffmpeg", "exit status 1"));
        acc.push("transcribe", CommandError::missing_key("audio_uri"));
        acc.push("extract", CommandError::cancelled("deadline exceeded"));

        assert_eq!(acc.len(), 3);
        assert_eq!(acc.commands(), vec!["extract", "transcribe"]);
        assert_eq!(acc.for_command("extract").len(), 2);
        assert!(acc.for_command("missing").is_empty());
    }

    #[test]
    fn test_report_keeps_command_and_cause() {
        let mut acc = ErrorAccumulator::new();
        acc.push(
            "extract",
            CommandError::tool_launch(
                "ffmpeg",
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            ),
        );

        let report = acc.report();
        assert_eq!(report.entries[0].command, "extract");
        assert_eq!(report.entries[0].kind, "ExternalToolFailure");
        assert_eq!(
            report.to_string(),
            "extract [ExternalToolFailure]: external tool 'ffmpeg' failed: could not launch process: no such file"
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["kind"], "ExternalToolFailure");
    }
}
