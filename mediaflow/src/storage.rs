//! Object references and the path conventions of the mounted storage view.
//!
//! Objects live at `gs://<bucket>/<name>` remotely and at
//! `<mount root>/<bucket>/<name>` on the local mount.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static OBJECT_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gs://([a-z0-9][a-z0-9._-]*[a-z0-9])/(.+)$").expect("valid object URI pattern")
});

/// A reference to an object in a storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageObject {
    /// Bucket holding the object.
    pub bucket: String,
    /// Object name, possibly containing `/` separators.
    pub name: String,
}

impl StorageObject {
    /// Creates a new object reference.
    #[must_use]
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
        }
    }

    /// Parses a `gs://bucket/name` URI.
    #[must_use]
    pub fn parse_uri(uri: &str) -> Option<Self> {
        let caps = OBJECT_URI.captures(uri)?;
        Some(Self::new(&caps[1], &caps[2]))
    }

    /// Returns the `gs://` URI of the object.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.name)
    }

    /// Returns where the object appears under a mount root.
    #[must_use]
    pub fn mount_path(&self, mount_root: &Path) -> PathBuf {
        mount_root.join(&self.bucket).join(&self.name)
    }

    /// Returns a sibling object in `bucket` whose name swaps `strip_suffix` for `new_suffix`.
    #[must_use]
    pub fn derive(&self, bucket: impl Into<String>, strip_suffix: &str, new_suffix: &str) -> Self {
        Self::new(bucket, derive_name(&self.name, strip_suffix, new_suffix))
    }
}

impl fmt::Display for StorageObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.name)
    }
}

/// Strips `strip_suffix` from `name` when present and appends `new_suffix`.
#[must_use]
pub fn derive_name(name: &str, strip_suffix: &str, new_suffix: &str) -> String {
    let stem = name.strip_suffix(strip_suffix).unwrap_or(name);
    format!("{stem}{new_suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_derive_audio_object() {
        let video = StorageObject::new("raw", "video.mp4");
        let audio = video.derive("audio", ".mp4", ".wav");

        assert_eq!(audio, StorageObject::new("audio", "video.wav"));
        assert_eq!(audio.uri(), "gs://audio/video.wav");
    }

    #[test]
    fn test_derive_name_without_suffix_appends() {
        assert_eq!(derive_name("clip.mov", ".mp4", ".wav"), "clip.mov.wav");
        assert_eq!(derive_name("a/b/clip.mp4", ".mp4", ".wav"), "a/b/clip.wav");
    }

    #[test]
    fn test_mount_path() {
        let obj = StorageObject::new("raw", "shows/ep1.mp4");
        assert_eq!(
            obj.mount_path(Path::new("/mnt/gcs")),
            PathBuf::from("/mnt/gcs/raw/shows/ep1.mp4")
        );
    }

    #[test]
    fn test_parse_uri() {
        let obj = StorageObject::parse_uri("gs://audio/shows/ep1.wav").unwrap();
        assert_eq!(obj.bucket, "audio");
        assert_eq!(obj.name, "shows/ep1.wav");
        assert_eq!(obj.to_string(), "gs://audio/shows/ep1.wav");
    }

    #[test]
    fn test_parse_uri_rejects_malformed() {
        assert!(StorageObject::parse_uri("s3://audio/a.wav").is_none());
        assert!(StorageObject::parse_uri("gs://audio").is_none());
        assert!(StorageObject::parse_uri("gs://Audio/a.wav").is_none());
        assert!(StorageObject::parse_uri("/mnt/audio/a.wav").is_none());
    }
}
