// SPDX-License-Identifier: Apache-2.0

//! Top-level facade wiring discovery, checkpointing, and the poll loop.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::TailerConfig;
use crate::engine::Engine;
use crate::error::{BoxError, Error, Result};
use crate::finder::create_finder;
use crate::persistence::{self, SnapshotPersister};
use crate::selector::FileSelector;
use crate::store::CheckpointStore;

/// A checkpointed multi-file tailer.
///
/// Construction loads any existing snapshot and restores per-file positions;
/// [`follow`](Tailer::follow) then discovers files, reads appended lines,
/// and delivers them to a consumer callback until cancelled. A final
/// snapshot is written on the way out, so the next run resumes where this
/// one stopped.
pub struct Tailer {
    config: TailerConfig,
    store: Arc<CheckpointStore>,
    selector: Arc<FileSelector>,
}

impl Tailer {
    /// Validate the configuration, restore persisted positions, and prepare
    /// file discovery. Fails if the snapshot file exists but cannot be
    /// parsed, since silently starting from zero would re-deliver
    /// everything.
    pub fn new(config: TailerConfig) -> Result<Self> {
        config.validate().map_err(Error::Config)?;

        let snapshot = persistence::load(&config.snapshot_path)?;
        if !snapshot.is_empty() {
            info!(
                entries = snapshot.len(),
                path = ?config.snapshot_path,
                "restored checkpoint snapshot"
            );
        }

        let store = Arc::new(CheckpointStore::new(config.max_read_size));
        store.restore(snapshot);

        let finder = create_finder(&config.selection)?;
        let selector = Arc::new(FileSelector::new(finder, config.refresh_interval));

        Ok(Self {
            config,
            store,
            selector,
        })
    }

    /// Tail until the token is cancelled, delivering each complete line to
    /// `consume` together with the path it came from.
    ///
    /// Background tasks (discovery refresh, periodic snapshots) stop after
    /// the poll loop does, so the final snapshot observes every offset the
    /// loop advanced.
    pub async fn follow<C>(&self, cancel: CancellationToken, consume: C) -> Result<()>
    where
        C: FnMut(&Path, &str) -> std::result::Result<(), BoxError>,
    {
        info!(selection = ?self.config.selection, "tailer starting");

        // Dedicated token, cancelled only once the engine has returned. A
        // child of the caller's token would wake the persister's final flush
        // during the engine's last pass, and offsets advanced by that pass
        // could miss the final snapshot.
        let tasks_cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        {
            let selector = self.selector.clone();
            let cancel = tasks_cancel.clone();
            tasks.spawn(async move { selector.run(cancel).await });
        }

        let persister = SnapshotPersister::new(
            self.config.snapshot_path.clone(),
            self.config.snapshot_interval,
            self.store.clone(),
        );
        tasks.spawn(persister.run(tasks_cancel.clone()));

        let engine = Engine::new(self.selector.clone(), self.store.clone(), self.config.pause);
        let result = engine.run(cancel, consume).await;

        tasks_cancel.cancel();
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "background task failed");
            }
        }
        self.store.close();

        info!("tailer stopped");
        result
    }
}
