// SPDX-License-Identifier: Apache-2.0

//! Configuration for the tailer.

use std::path::PathBuf;
use std::time::Duration;

/// How the set of tailed files is discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Shell-glob pattern, re-evaluated on the refresh interval.
    Glob(String),
    /// Directory walked recursively on the refresh interval.
    Walk(PathBuf),
}

/// Configuration for a [`Tailer`](crate::Tailer).
#[derive(Debug, Clone)]
pub struct TailerConfig {
    /// File discovery strategy.
    pub selection: Selection,
    /// Where checkpoint snapshots are persisted.
    pub snapshot_path: PathBuf,
    /// Time between snapshot saves.
    pub snapshot_interval: Duration,
    /// Time between discovery refreshes.
    pub refresh_interval: Duration,
    /// Maximum bytes read from one file in one pass.
    pub max_read_size: u64,
    /// Sleep between passes over the file set.
    pub pause: Duration,
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self {
            selection: Selection::Glob(String::new()),
            snapshot_path: PathBuf::from("/var/lib/fantail/checkpoints.json"),
            snapshot_interval: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(10),
            max_read_size: 10 * 1024 * 1024,
            pause: Duration::from_secs(1),
        }
    }
}

impl TailerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        match &self.selection {
            Selection::Glob(pattern) if pattern.is_empty() => {
                return Err("glob pattern must not be empty".to_string());
            }
            Selection::Walk(root) if root.as_os_str().is_empty() => {
                return Err("walk root must not be empty".to_string());
            }
            _ => {}
        }
        if self.snapshot_path.as_os_str().is_empty() {
            return Err("snapshot path must not be empty".to_string());
        }
        if self.snapshot_interval.is_zero() {
            return Err("snapshot interval must be greater than zero".to_string());
        }
        if self.refresh_interval.is_zero() {
            return Err("refresh interval must be greater than zero".to_string());
        }
        if self.pause.is_zero() {
            return Err("pause must be greater than zero".to_string());
        }
        if self.max_read_size == 0 {
            return Err("max read size must be greater than zero".to_string());
        }
        Ok(())
    }
}
