//! Filesystem access used by the poller.

use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Reads a path's modification time.
///
/// A successful read also proves the path exists.
#[async_trait]
pub trait PathProbe: Send + Sync + Debug {
    /// Returns the last modification time of `path`.
    async fn modified(&self, path: &Path) -> io::Result<SystemTime>;
}

/// Probe backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

#[async_trait]
impl PathProbe for FsProbe {
    async fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        tokio::fs::metadata(path).await?.modified()
    }
}
