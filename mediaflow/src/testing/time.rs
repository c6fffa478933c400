//! Virtual time and scripted filesystem views for poller tests.

use crate::poller::{Clock, PathProbe};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// A clock whose `sleep` returns at once and advances virtual time.
#[derive(Debug)]
pub struct VirtualClock {
    now: Mutex<SystemTime>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::starting_at(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl VirtualClock {
    /// Creates a clock at a fixed, arbitrary instant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock at `start`.
    #[must_use]
    pub fn starting_at(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Moves time forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Returns every requested sleep, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    /// Returns the sum of all sleeps.
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

#[async_trait]
impl Clock for VirtualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

/// One scripted answer of a [`ScriptedProbe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    /// The path does not exist.
    Missing,
    /// The path exists with this modification time.
    Modified(SystemTime),
}

/// A probe replaying a fixed sequence of answers.
///
/// The last step repeats once the script is exhausted; an empty script
/// always answers `Missing`.
#[derive(Debug)]
pub struct ScriptedProbe {
    steps: Mutex<VecDeque<ProbeStep>>,
    last: Mutex<ProbeStep>,
    paths: Mutex<Vec<PathBuf>>,
}

impl ScriptedProbe {
    /// Creates a probe replaying `steps`.
    #[must_use]
    pub fn new(steps: Vec<ProbeStep>) -> Self {
        let last = steps.last().copied().unwrap_or(ProbeStep::Missing);
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(last),
            paths: Mutex::new(Vec::new()),
        }
    }

    /// A path that never appears.
    #[must_use]
    pub fn missing() -> Self {
        Self::new(Vec::new())
    }

    /// A path that exists with a fixed modification time.
    #[must_use]
    pub fn modified_at(modified: SystemTime) -> Self {
        Self::new(vec![ProbeStep::Modified(modified)])
    }

    /// A path missing for the first `misses` checks.
    #[must_use]
    pub fn appears_after(misses: usize, modified: SystemTime) -> Self {
        let mut steps = vec![ProbeStep::Missing; misses];
        steps.push(ProbeStep::Modified(modified));
        Self::new(steps)
    }

    /// Returns the number of checks made.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.paths.lock().len()
    }

    /// Returns the checked paths, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().clone()
    }
}

#[async_trait]
impl PathProbe for ScriptedProbe {
    async fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        self.paths.lock().push(path.to_path_buf());
        let step = self
            .steps
            .lock()
            .pop_front()
            .unwrap_or_else(|| *self.last.lock());
        match step {
            ProbeStep::Missing => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )),
            ProbeStep::Modified(at) => Ok(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_virtual_clock_records_sleeps() {
        let clock = VirtualClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_secs(10)).await;
        clock.sleep(Duration::from_secs(5)).await;

        assert_eq!(clock.sleeps(), vec![Duration::from_secs(10), Duration::from_secs(5)]);
        assert_eq!(clock.now(), start + Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_scripted_probe_repeats_last_step() {
        let probe = ScriptedProbe::appears_after(1, SystemTime::UNIX_EPOCH);
        let path = Path::new("/mnt/a");

        assert!(probe.modified(path).await.is_err());
        assert_eq!(probe.modified(path).await.unwrap(), SystemTime::UNIX_EPOCH);
        assert_eq!(probe.modified(path).await.unwrap(), SystemTime::UNIX_EPOCH);
        assert_eq!(probe.calls(), 3);
    }
}
