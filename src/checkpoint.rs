// SPDX-License-Identifier: Apache-2.0

//! Per-file read position with rotation and truncation detection.
//!
//! A checkpoint records how far into a file delivery has progressed and the
//! (device, inode) identity of the file those bytes came from. Before every
//! read the checkpoint re-stats its path: an identity change means the path
//! now names a different file (rotation), a shrink below the recorded size
//! means the same file was rewritten in place (copy-truncate), and either
//! one restarts delivery from offset zero.

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::file_id::FileId;

/// Read position and identity for one tracked path.
///
/// The handle is exclusively owned here; it is only ever replaced by closing
/// the old one and opening a new one inside [`check`].
///
/// [`check`]: Checkpoint::check
#[derive(Debug, Default)]
pub(crate) struct Checkpoint {
    /// Bytes already delivered from the current file.
    pub(crate) offset: u64,
    /// File size observed by the most recent check.
    pub(crate) size: u64,
    /// Identity of the file the offset refers to.
    pub(crate) file_id: FileId,
    /// Open handle, absent while the file is inaccessible or not yet opened.
    pub(crate) file: Option<File>,
}

impl Checkpoint {
    /// Reconstruct a checkpoint from persisted state. The handle is absent
    /// until the next check reopens the path.
    pub(crate) fn from_persisted(offset: u64, size: u64, file_id: FileId) -> Self {
        Self {
            offset,
            size,
            file_id,
            file: None,
        }
    }

    /// Reconcile this checkpoint with whatever is currently at `path`.
    ///
    /// A missing or permission-denied path is a transient absence: the handle
    /// is dropped, the recorded position is kept for the file's possible
    /// return, and no error is surfaced. Any other stat or open failure is
    /// returned to the caller.
    pub(crate) fn check(&mut self, path: &Path) -> Result<()> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
                ) =>
            {
                if self.file.take().is_some() {
                    debug!(path = ?path, "file became inaccessible, dropped handle");
                }
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let current_id = FileId::from_metadata(&metadata);
        let current_size = metadata.len();

        if self.file.is_none() && self.offset > 0 {
            // Resuming from persisted state, or the file came back after an
            // absence. Reopen at the recorded position; the recorded identity
            // and size below still decide whether the file changed while no
            // handle was held.
            let mut file = File::open(path)?;
            file.seek(SeekFrom::Start(self.offset))?;
            self.file = Some(file);
        }

        if self.size > current_size || self.file_id != current_id {
            if self.file_id != FileId::default() {
                debug!(
                    path = ?path,
                    old_id = %self.file_id,
                    new_id = %current_id,
                    recorded_size = self.size,
                    current_size,
                    "rotation or truncation detected, restarting from the beginning"
                );
            }
            self.file = None;
            let file = File::open(path)?;
            self.offset = 0;
            self.file_id = current_id;
            self.file = Some(file);
        } else if self.file.is_none() {
            // Identity unchanged and offset is zero, e.g. persisted before
            // the first byte was read. Reopen without resetting anything.
            self.file = Some(File::open(path)?);
        }

        self.size = current_size;
        Ok(())
    }

    /// Drop the open handle, keeping position and identity.
    pub(crate) fn close(&mut self) {
        self.file = None;
    }
}
