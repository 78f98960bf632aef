// Replication and persistence
// Leader checkpoints the directory; backups pull full snapshots from the leader.
// Backups are read replicas: a write accepted directly by a backup is overwritten
// by its next catch-up unless it becomes leader first.

use std::{sync::Arc, time::Duration};

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use idmesh_common::IdmeshError;
use idmesh_directory::{CheckpointStore, DirectoryStore};

use crate::{metrics, model::ReplicationConfig};

use super::{
    election::ElectionEngine, failure_detector::FailureDetector, transport::PeerTransport,
};

pub struct ReplicationManager {
    config: ReplicationConfig,
    engine: Arc<ElectionEngine>,
    store: Arc<DirectoryStore>,
    checkpoints: CheckpointStore,
    detector: Arc<dyn FailureDetector>,
    transport: Arc<dyn PeerTransport>,
    running: Arc<RwLock<bool>>,
}

impl ReplicationManager {
    pub fn new(
        config: ReplicationConfig,
        engine: Arc<ElectionEngine>,
        store: Arc<DirectoryStore>,
        detector: Arc<dyn FailureDetector>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        let checkpoints = CheckpointStore::new(config.data_dir.clone());
        Self {
            config,
            engine,
            store,
            checkpoints,
            detector,
            transport,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Load the last checkpoint into the directory; returns the number of users loaded
    pub fn reload(&self) -> Result<usize, IdmeshError> {
        match self.checkpoints.load()? {
            Some(snapshot) => {
                let users = snapshot.len();
                self.store.restore(snapshot);
                info!(
                    users,
                    dir = %self.checkpoints.dir().display(),
                    "Loaded directory checkpoint"
                );
                Ok(users)
            }
            None => {
                info!(
                    dir = %self.checkpoints.dir().display(),
                    "No checkpoint found, starting with an empty directory"
                );
                Ok(0)
            }
        }
    }

    /// Write a checkpoint of the current directory
    pub async fn checkpoint(&self) -> Result<(), IdmeshError> {
        let snapshot = self.store.snapshot();
        let checkpoints = self.checkpoints.clone();

        let result = tokio::task::spawn_blocking(move || checkpoints.save(&snapshot))
            .await
            .map_err(|e| IdmeshError::Internal(format!("checkpoint task failed: {}", e)))
            .and_then(|r| r);

        metrics::record_checkpoint(result.is_ok());
        result
    }

    /// Pull the leader's directory when this node is a reachable leader's backup.
    ///
    /// Returns whether the local directory was replaced.
    pub async fn catch_up(&self) -> Result<bool, IdmeshError> {
        if self.engine.is_leader() {
            return Ok(false);
        }

        let leader = self.engine.believed_leader();
        if !self.detector.is_reachable(&leader.address).await {
            debug!(leader = %leader, "Leader unreachable, skipping catch-up");
            return Ok(false);
        }

        let result = self.transport.snapshot_directory(&leader.address).await;
        metrics::record_catch_up(result.is_ok());
        let snapshot = result?;

        // Leadership may have moved to this node while the snapshot was in flight
        if self.engine.is_leader() {
            return Ok(false);
        }

        debug!(leader = %leader, users = snapshot.len(), "Restored directory from leader");
        self.store.restore(snapshot);
        Ok(true)
    }

    async fn checkpoint_tick(&self) {
        if !self.engine.is_leader() {
            return;
        }
        if let Err(e) = self.checkpoint().await {
            error!(error = %e, "Checkpoint failed, skipping this cycle");
        }
    }

    async fn catch_up_tick(&self) {
        if let Err(e) = self.catch_up().await {
            debug!(error = %e, "Catch-up failed, retrying next cycle");
        }
    }

    /// Start the checkpoint and catch-up tasks
    pub async fn start(self: &Arc<Self>) {
        let mut running = self.running.write().await;
        if *running {
            return;
        }
        *running = true;
        drop(running);

        info!(
            checkpoint_interval = ?self.config.checkpoint_interval,
            catch_up_interval = ?self.config.catch_up_interval,
            "Starting replication tasks"
        );

        self.spawn_periodic(self.config.checkpoint_interval, |manager| async move {
            manager.checkpoint_tick().await
        });
        self.spawn_periodic(self.config.catch_up_interval, |manager| async move {
            manager.catch_up_tick().await
        });
    }

    fn spawn_periodic<F, Fut>(self: &Arc<Self>, period: Duration, tick: F)
    where
        F: Fn(Arc<Self>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let manager = self.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;

                {
                    let is_running = running.read().await;
                    if !*is_running {
                        break;
                    }
                }

                tick(manager.clone()).await;
            }
        });
    }

    /// Stop the periodic tasks
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        info!("Stopped replication tasks");
    }

    /// Best-effort final checkpoint, on leader and backups alike
    pub async fn shutdown_hook(&self) {
        self.stop().await;
        match self.checkpoint().await {
            Ok(()) => info!(users = self.store.len(), "Final checkpoint written"),
            Err(e) => warn!(error = %e, "Final checkpoint failed"),
        }
    }
}
