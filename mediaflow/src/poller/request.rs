//! Poll requests and the attempt state machine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of checks per poll.
pub const DEFAULT_FILE_CHECK_RETRIES: u32 = 5;

/// Default delay between two checks.
pub const DEFAULT_FILE_CHECK_DELAY: Duration = Duration::from_secs(10);

/// One polling call: which path, how often, and how fresh it must be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    path: PathBuf,
    attempts: u32,
    delay: Duration,
    max_age: Option<Duration>,
}

impl PollRequest {
    /// Creates a request with the default budget and delay.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            attempts: DEFAULT_FILE_CHECK_RETRIES,
            delay: DEFAULT_FILE_CHECK_DELAY,
            max_age: None,
        }
    }

    /// Sets the number of checks. At least one check is always made.
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Sets the delay between checks.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the freshness threshold used by freshness waits.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Returns the polled path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the attempt budget.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the delay between checks.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the freshness threshold. `None` accepts any modification time.
    #[must_use]
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Longest time a poll can spend sleeping: no delay follows the last check.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.delay * self.attempts.saturating_sub(1)
    }
}

/// Where a polling call stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    /// No check made yet.
    Pending,
    /// A check failed and another is scheduled.
    Retrying,
    /// A check succeeded.
    Succeeded,
    /// The last allowed check failed.
    Exhausted,
    /// The scope was cancelled before the poll finished.
    Cancelled,
}

impl PollState {
    /// Applies the result of one check.
    #[must_use]
    pub fn advance(self, satisfied: bool, last_attempt: bool) -> Self {
        if self.is_terminal() {
            return self;
        }
        if satisfied {
            Self::Succeeded
        } else if last_attempt {
            Self::Exhausted
        } else {
            Self::Retrying
        }
    }

    /// Returns true once no further check will be made.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Exhausted | Self::Cancelled)
    }
}

/// Result of a polling call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollReport {
    /// Final state.
    pub state: PollState,
    /// Number of checks made.
    pub attempts: u32,
}

impl PollReport {
    /// Returns true if the last check was satisfied.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.state == PollState::Succeeded
    }
}
