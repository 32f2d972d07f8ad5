// SPDX-License-Identifier: Apache-2.0

//! Published file list with periodic refresh.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Result;
use crate::finder::FileFinder;

/// Holds the most recent successful discovery result and refreshes it on an
/// interval.
///
/// The list has its own lock, separate from the checkpoint store's, and
/// queries return a copy: each pass of the poll loop works from one
/// consistent point-in-time file set.
pub struct FileSelector {
    finder: Box<dyn FileFinder + Send + Sync>,
    interval: Duration,
    files: Mutex<Vec<PathBuf>>,
}

impl FileSelector {
    pub fn new(finder: Box<dyn FileFinder + Send + Sync>, interval: Duration) -> Self {
        Self {
            finder,
            interval,
            files: Mutex::new(Vec::new()),
        }
    }

    /// Copy of the file list as of the last successful refresh.
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().clone()
    }

    /// Re-run discovery and publish the result, returning the new count. On
    /// failure the previously published list stays in place.
    pub fn refresh(&self) -> Result<usize> {
        let found = self.finder.find_files()?;
        let count = found.len();
        *self.files.lock().unwrap() = found;

        Ok(count)
    }

    /// Refresh immediately, then once per interval until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            select! {
                _ = ticker.tick() => match self.refresh() {
                    Ok(count) => debug!(count, "refreshed file list"),
                    Err(e) => warn!(error = %e, "file discovery failed, keeping previous list"),
                },
                _ = cancel.cancelled() => return,
            }
        }
    }
}
