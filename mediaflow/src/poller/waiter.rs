//! Existence and freshness waits over an eventually consistent mount.

use super::{Clock, FsProbe, PathProbe, PollReport, PollRequest, PollState, SystemClock};
use crate::cancellation::Scope;
use crate::errors::CommandError;
use std::io;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Bounded, fixed-interval polling of a path on a mounted bucket.
#[derive(Debug, Clone)]
pub struct ConsistencyPoller {
    clock: Arc<dyn Clock>,
    probe: Arc<dyn PathProbe>,
}

impl Default for ConsistencyPoller {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(FsProbe))
    }
}

impl ConsistencyPoller {
    /// Creates a poller with the given clock and probe.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, probe: Arc<dyn PathProbe>) -> Self {
        Self { clock, probe }
    }

    /// Returns the clock used between attempts.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Waits until the requested path exists.
    ///
    /// Returns as soon as a check succeeds. No delay follows the final check.
    ///
    /// # Errors
    ///
    /// Returns `ConsistencyTimeout` with the last I/O error once the budget
    /// is spent, or `Cancelled` if the scope is cancelled first.
    pub async fn wait_for_file(
        &self,
        request: &PollRequest,
        scope: &Scope,
    ) -> Result<PollReport, CommandError> {
        let path = request.path();
        let budget = request.attempts();
        let mut state = PollState::Pending;
        let mut last_error = None;

        for attempt in 1..=budget {
            if scope.is_cancelled() {
                return Err(cancelled(scope));
            }

            let satisfied = match self.probe.modified(path).await {
                Ok(_) => true,
                Err(err) => {
                    last_error = Some(err);
                    false
                }
            };

            state = state.advance(satisfied, attempt == budget);
            match state {
                PollState::Succeeded => {
                    debug!(path = %path.display(), attempt, "File is visible");
                    return Ok(PollReport { state, attempts: attempt });
                }
                PollState::Exhausted => break,
                _ => {
                    info!(
                        path = %path.display(),
                        attempt,
                        budget,
                        "Waiting for file to appear"
                    );
                    if !self.pause(request.delay(), scope).await {
                        return Err(cancelled(scope));
                    }
                }
            }
        }

        warn!(path = %path.display(), attempts = budget, "File not found after retries");
        Err(CommandError::ConsistencyTimeout {
            path: path.to_path_buf(),
            attempts: budget,
            source: last_error
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "path never checked")),
        })
    }

    /// Waits until the requested path was modified within the request's
    /// freshness threshold.
    ///
    /// Never fails: once the budget is spent, or the scope is cancelled, the
    /// caller proceeds with whatever is on disk.
    pub async fn wait_for_file_update(&self, request: &PollRequest, scope: &Scope) -> PollReport {
        let path = request.path();
        let budget = request.attempts();
        let mut state = PollState::Pending;

        for attempt in 1..=budget {
            if scope.is_cancelled() {
                info!(path = %path.display(), attempt, "Freshness wait cancelled");
                return PollReport {
                    state: PollState::Cancelled,
                    attempts: attempt - 1,
                };
            }

            let satisfied = match self.probe.modified(path).await {
                Ok(modified) => self.is_fresh(modified, request.max_age()),
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "File not readable yet");
                    false
                }
            };

            state = state.advance(satisfied, attempt == budget);
            match state {
                PollState::Succeeded => {
                    info!(path = %path.display(), attempt, "File has been updated recently");
                    return PollReport { state, attempts: attempt };
                }
                PollState::Exhausted => break,
                _ => {
                    info!(
                        path = %path.display(),
                        attempt,
                        budget,
                        "Waiting for file to be updated"
                    );
                    if !self.pause(request.delay(), scope).await {
                        info!(path = %path.display(), attempt, "Freshness wait cancelled");
                        return PollReport {
                            state: PollState::Cancelled,
                            attempts: attempt,
                        };
                    }
                }
            }
        }

        warn!(
            path = %path.display(),
            attempts = budget,
            "File not updated after retries, proceeding with existing content"
        );
        PollReport {
            state: PollState::Exhausted,
            attempts: budget,
        }
    }

    fn is_fresh(&self, modified: SystemTime, max_age: Option<Duration>) -> bool {
        let Some(max_age) = max_age else {
            return true;
        };
        // A modification time ahead of the clock counts as age zero.
        let age = self
            .clock
            .now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age < max_age
    }

    /// Sleeps for `delay`. Returns false if the scope was cancelled first.
    async fn pause(&self, delay: Duration, scope: &Scope) -> bool {
        scope
            .run_until_cancelled(self.clock.sleep(delay))
            .await
            .is_some()
    }
}

fn cancelled(scope: &Scope) -> CommandError {
    CommandError::cancelled(scope.reason().unwrap_or_else(|| "cancelled".to_string()))
}
