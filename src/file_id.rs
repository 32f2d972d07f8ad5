// SPDX-License-Identifier: Apache-2.0

//! File identity based on device and inode.
//!
//! The (device, inode) pair identifies a file's underlying storage object
//! independently of its path, so it survives renames and exposes rotation:
//! when a log rotator swaps a new file in at the same path, the identity
//! changes even if the size does not.

use serde::{Deserialize, Serialize};
use std::fs::{File, Metadata};
use std::io;
use std::path::Path;

/// Unique identifier for a file's underlying storage object.
///
/// The default value `0:0` never matches a real file and marks a checkpoint
/// that has not observed its file yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId {
    /// Device ID
    dev: u64,
    /// Inode number
    ino: u64,
}

impl FileId {
    /// Create a FileId from raw device and inode values.
    /// Used for loading persisted state.
    pub fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// Create a FileId from already-fetched metadata.
    ///
    /// Rotation checks stat a path once and derive both size and identity
    /// from the same result, so this is the primary constructor.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }

    /// Create a FileId from an open file handle.
    pub fn from_file(file: &File) -> io::Result<Self> {
        let metadata = file.metadata()?;
        Ok(Self::from_metadata(&metadata))
    }

    /// Create a FileId from a path.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::from_metadata(&metadata))
    }

    /// Get the device ID.
    pub fn dev(&self) -> u64 {
        self.dev
    }

    /// Get the inode number.
    pub fn ino(&self) -> u64 {
        self.ino
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.dev, self.ino)
    }
}
