//! Per-run execution report.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a command fared during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    /// Ran without recording an error.
    Succeeded,
    /// Ran and recorded at least one error.
    Failed,
    /// Not started because the run was cancelled.
    Skipped,
}

impl std::fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Outcome and timing of one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Command name.
    pub command: String,
    /// Outcome.
    pub outcome: CommandOutcome,
    /// Wall time spent in the command.
    pub duration_ms: f64,
}

/// What happened during one pipeline run.
///
/// Overall success is still decided from the context's error accumulator;
/// the report adds ordering and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Pipeline name.
    pub pipeline: String,
    /// Run the report belongs to.
    pub run_id: Uuid,
    /// One record per command, in execution order.
    pub records: Vec<CommandRecord>,
    /// Total wall time.
    pub duration_ms: f64,
    /// Whether the run's scope was cancelled before every command started.
    pub cancelled: bool,
}

impl PipelineReport {
    /// Returns true if every command succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.records
            .iter()
            .all(|r| r.outcome == CommandOutcome::Succeeded)
    }

    /// Returns the outcome of `command`.
    #[must_use]
    pub fn outcome_of(&self, command: &str) -> Option<CommandOutcome> {
        self.records
            .iter()
            .find(|r| r.command == command)
            .map(|r| r.outcome)
    }

    /// Returns the number of commands with `outcome`.
    #[must_use]
    pub fn count(&self, outcome: CommandOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(command: &str, outcome: CommandOutcome) -> CommandRecord {
        CommandRecord {
            command: command.to_string(),
            outcome,
            duration_ms: 1.0,
        }
    }

    #[test]
    fn test_report_queries() {
        let report = PipelineReport {
            pipeline: "media".to_string(),
            run_id: Uuid::new_v4(),
            records: vec![
                record("extract", CommandOutcome::Succeeded),
                record("transcribe", CommandOutcome::Failed),
                record("notify", CommandOutcome::Skipped),
            ],
            duration_ms: 3.0,
            cancelled: true,
        };

        assert!(!report.is_success());
        assert_eq!(report.outcome_of("transcribe"), Some(CommandOutcome::Failed));
        assert_eq!(report.outcome_of("unknown"), None);
        assert_eq!(report.count(CommandOutcome::Skipped), 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&CommandOutcome::Skipped).unwrap();
        assert_eq!(json, "\"skipped\"");
    }
}
