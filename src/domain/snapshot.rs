//! Snapshot handles returned by the camera.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to a captured image on disk.
///
/// The handle stays valid until it is overwritten by a newer capture or the
/// file behind it is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHandle {
    /// Image file written by the snapshot provider
    path: PathBuf,

    /// When the capture finished
    captured_at: DateTime<Utc>,
}

impl SnapshotHandle {
    /// Create a handle for a file captured just now
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::captured_at(path, Utc::now())
    }

    /// Create a handle with an explicit capture time
    pub fn captured_at(path: impl Into<PathBuf>, captured_at: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            captured_at,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Return the image path if the file still exists
    pub fn resolve(&self) -> Option<&Path> {
        if self.path.is_file() {
            Some(&self.path)
        } else {
            None
        }
    }
}
