//! Cancellable execution scope carried by every run context.

use super::CancellationToken;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Deadline and cancellation propagation for the I/O a command performs.
///
/// Cloning a scope shares the underlying token, so a caller can keep a clone
/// to cancel a run whose context is borrowed by the executor.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    token: Arc<CancellationToken>,
    deadline: Option<Instant>,
}

impl Scope {
    /// Creates a scope with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope around an existing token.
    #[must_use]
    pub fn with_token(token: Arc<CancellationToken>) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Sets a deadline relative to now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the underlying token.
    #[must_use]
    pub fn token(&self) -> &Arc<CancellationToken> {
        &self.token
    }

    /// Requests cancellation of every command sharing this scope.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.token.cancel(reason);
    }

    /// Returns true once cancelled or past the deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Returns why the scope is no longer live.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        if let Some(reason) = self.token.reason() {
            return Some(reason);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some("deadline exceeded".to_string()),
            _ => None,
        }
    }

    /// Completes once the scope is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Drives `fut` until it completes or the scope is cancelled.
    ///
    /// Returns `None` if the scope is or becomes cancelled first; `fut` is
    /// then dropped without being polled again.
    pub async fn run_until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_live_by_default() {
        let scope = Scope::new();
        assert!(!scope.is_cancelled());
        assert!(scope.reason().is_none());
        assert!(scope.deadline().is_none());
    }

    #[test]
    fn test_clone_shares_token() {
        let scope = Scope::new();
        let handle = scope.clone();
        handle.cancel("operator abort");

        assert!(scope.is_cancelled());
        assert_eq!(scope.reason(), Some("operator abort".to_string()));
    }

    #[tokio::test]
    async fn test_deadline_expires() {
        let scope = Scope::new().with_timeout(Duration::from_millis(5));
        tokio::time::timeout(Duration::from_secs(1), scope.cancelled())
            .await
            .unwrap();

        assert!(scope.is_cancelled());
        assert_eq!(scope.reason(), Some("deadline exceeded".to_string()));
    }

    #[tokio::test]
    async fn test_run_until_cancelled() {
        let scope = Scope::new();
        assert_eq!(scope.run_until_cancelled(async { 7 }).await, Some(7));

        scope.cancel("stop");
        let pending = std::future::pending::<()>();
        assert_eq!(scope.run_until_cancelled(pending).await, None);
    }
}
