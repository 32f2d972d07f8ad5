// SPDX-License-Identifier: Apache-2.0

//! The poll loop: repeated passes over the file set, delivering lines.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{BoxError, Error, Result};
use crate::selector::FileSelector;
use crate::store::LineSource;

/// Drives repeated passes over the discovered file set.
///
/// Each pass takes a point-in-time copy of the file list and reads the files
/// in order, handing every returned line to the consumer before moving to
/// the next file. Cancellation is honored between files, so the file being
/// read when shutdown begins still delivers the lines already taken from it.
/// A read error or a consumer rejection ends the run; progress for lines
/// delivered before the failure is already recorded, so a restart does not
/// repeat them.
pub struct Engine<S> {
    selector: Arc<FileSelector>,
    source: Arc<S>,
    pause: Duration,
}

impl<S: LineSource> Engine<S> {
    pub fn new(selector: Arc<FileSelector>, source: Arc<S>, pause: Duration) -> Self {
        Self {
            selector,
            source,
            pause,
        }
    }

    /// Run passes until cancelled. Returns `Ok(())` on cancellation, or the
    /// first read or consumer error.
    pub async fn run<C>(&self, cancel: CancellationToken, mut consume: C) -> Result<()>
    where
        C: FnMut(&Path, &str) -> std::result::Result<(), BoxError>,
    {
        loop {
            for path in self.selector.files() {
                if cancel.is_cancelled() {
                    debug!("cancelled mid-pass, stopping");
                    return Ok(());
                }

                let lines = self.source.read_lines(&path)?;
                for line in &lines {
                    consume(&path, line).map_err(Error::Consumer)?;
                }
                if !lines.is_empty() {
                    debug!(path = ?path, count = lines.len(), "delivered lines");
                }
            }

            select! {
                _ = cancel.cancelled() => {
                    debug!("cancelled, stopping");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.pause) => {}
            }
        }
    }
}
