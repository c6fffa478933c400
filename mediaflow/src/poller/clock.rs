//! Time source used between poll attempts.

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::{Duration, SystemTime};

/// Wall-clock reads and sleeps, injectable for tests.
#[async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Returns the current wall-clock time.
    fn now(&self) -> SystemTime;

    /// Suspends the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// The real clock, backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
