// SPDX-License-Identifier: Apache-2.0

//! Snapshot persistence for checkpoint state.
//!
//! The snapshot file is a JSON object keyed by file path, each value holding
//! `offset`, `size`, `dev`, and `ino` for that path. Open handles have no
//! durable representation and are never persisted. Saves rewrite the file in
//! place, not via a temp-file rename, so a crash mid-write can leave the file
//! corrupt; a corrupt file fails the next startup rather than silently
//! resetting every offset.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::store::CheckpointStore;

/// Persisted state for one tracked path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Bytes already delivered.
    pub offset: u64,
    /// File size at the last check.
    pub size: u64,
    /// Device ID of the tracked file.
    pub dev: u64,
    /// Inode number of the tracked file.
    pub ino: u64,
}

/// Point-in-time projection of a checkpoint store, keyed by path.
///
/// A sorted map so saved files serialize in a stable order.
pub type Snapshot = BTreeMap<String, SnapshotEntry>;

/// Load a snapshot from `path`.
///
/// A missing file is an empty snapshot, not an error; anything else that
/// cannot be read or parsed is.
pub fn load(path: &Path) -> Result<Snapshot> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = ?path, "no snapshot file, starting empty");
            return Ok(Snapshot::new());
        }
        Err(e) => return Err(e.into()),
    };
    let snapshot = serde_json::from_slice(&bytes)?;
    Ok(snapshot)
}

/// Serialize `snapshot` and overwrite `path` in full, creating parent
/// directories as needed. Returns the number of bytes written.
pub(crate) fn write(path: &Path, snapshot: &Snapshot) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = serde_json::to_vec(snapshot)?;
    fs::write(path, &bytes)?;
    Ok(bytes.len())
}

/// Background task that saves the store's snapshot on a fixed interval.
///
/// Saves once immediately at startup, then once per tick. On cancellation it
/// flushes one final snapshot so a graceful shutdown loses no progress. Save
/// failures are logged and retried on the next tick; they never stop the
/// task.
pub struct SnapshotPersister {
    path: PathBuf,
    interval: Duration,
    store: Arc<CheckpointStore>,
}

impl SnapshotPersister {
    pub fn new(path: PathBuf, interval: Duration, store: Arc<CheckpointStore>) -> Self {
        Self {
            path,
            interval,
            store,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        // the first tick completes immediately, giving the startup save
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            select! {
                _ = ticker.tick() => {
                    self.save();
                }
                _ = cancel.cancelled() => {
                    break;
                }
            }
        }

        debug!("persister cancelled, flushing final snapshot");
        self.save();
        info!(path = ?self.path, "final snapshot flushed");
    }

    fn save(&self) {
        match self.store.save(&self.path) {
            Ok(bytes) => {
                debug!(path = ?self.path, bytes, "snapshot saved");
            }
            Err(e) => {
                error!(path = ?self.path, error = %e, "failed to save snapshot");
            }
        }
    }
}
