//! Node composition root
//!
//! Wires the directory store, cluster state, election engine, membership
//! registry and replication manager together, and runs bootstrap discovery.

use std::sync::Arc;

use tracing::{error, info, warn};

use idmesh_api::model::PeerId;
use idmesh_client::{PeerClient, PeerClientConfig};
use idmesh_core::{
    ClusterState, Configuration, ElectionConfig, ElectionEngine, FailureDetector,
    MembershipRegistry, PeerTransport, ReplicationConfig, ReplicationManager, TcpFailureDetector,
    metrics,
};
use idmesh_directory::DirectoryStore;

pub struct Node {
    configuration: Configuration,
    store: Arc<DirectoryStore>,
    engine: Arc<ElectionEngine>,
    membership: Arc<MembershipRegistry>,
    replication: Arc<ReplicationManager>,
}

impl Node {
    pub fn new(
        configuration: Configuration,
        state: ClusterState,
        detector: Arc<dyn FailureDetector>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        let store = Arc::new(DirectoryStore::with_verbose(configuration.verbose()));
        let state = state.shared();

        let engine = Arc::new(ElectionEngine::new(
            state.clone(),
            detector.clone(),
            transport.clone(),
            ElectionConfig::from_configuration(&configuration),
        ));
        let membership = Arc::new(MembershipRegistry::new(state, transport.clone()));
        let replication = Arc::new(ReplicationManager::new(
            ReplicationConfig::from_configuration(&configuration),
            engine.clone(),
            store.clone(),
            detector,
            transport,
        ));

        Self {
            configuration,
            store,
            engine,
            membership,
            replication,
        }
    }

    /// Reload the last checkpoint, then find and join an existing cluster or found one
    pub async fn bootstrap(configuration: Configuration) -> anyhow::Result<Self> {
        let detector: Arc<dyn FailureDetector> =
            Arc::new(TcpFailureDetector::from_configuration(&configuration));
        let transport: Arc<dyn PeerTransport> = Arc::new(PeerClient::new(
            PeerClientConfig::from_configuration(&configuration),
        )?);

        let state = discover_cluster(
            &configuration.advertise_address(),
            &configuration.cluster_seeds(),
            configuration.founding_rank(),
            detector.as_ref(),
            transport.as_ref(),
        )
        .await;

        let node = Self::new(configuration, state, detector, transport);
        if let Err(e) = node.replication.reload() {
            error!(error = %e, "Checkpoint reload failed, starting with an empty directory");
        }

        let view = node.engine.view();
        metrics::set_cluster_members(view.members.len());
        info!(
            self_peer = %view.self_peer,
            leader = %view.leader,
            members = view.members.len(),
            users = node.store.len(),
            "Node bootstrapped"
        );

        Ok(node)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn store(&self) -> &Arc<DirectoryStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<ElectionEngine> {
        &self.engine
    }

    pub fn membership(&self) -> &Arc<MembershipRegistry> {
        &self.membership
    }

    pub fn replication(&self) -> &Arc<ReplicationManager> {
        &self.replication
    }

    /// Start the checkpoint and catch-up tasks
    pub async fn start(&self) {
        self.replication.start().await;
    }

    pub async fn shutdown(&self) {
        self.replication.shutdown_hook().await;
    }
}

/// Bootstrap discovery.
///
/// The first reachable seed that names a leader is asked for it, then the node
/// joins through that leader. With no usable seed the node founds a cluster of
/// its own at `founding_rank`.
pub async fn discover_cluster(
    self_address: &str,
    seeds: &[String],
    founding_rank: u64,
    detector: &dyn FailureDetector,
    transport: &dyn PeerTransport,
) -> ClusterState {
    for seed in seeds.iter().filter(|s| s.as_str() != self_address) {
        if !detector.is_reachable(seed).await {
            info!(seed = %seed, "Seed unreachable");
            continue;
        }

        let leader = match transport.current_leader(seed).await {
            Ok(leader) => leader,
            Err(e) => {
                warn!(seed = %seed, error = %e, "Seed did not report a leader");
                continue;
            }
        };

        match transport.join(&leader.address, self_address).await {
            Ok(response) => {
                info!(
                    assigned = %response.assigned,
                    leader = %leader,
                    members = response.members.len(),
                    "Joined cluster"
                );
                return ClusterState::joined(response.assigned, leader, response.members);
            }
            Err(e) => warn!(leader = %leader, error = %e, "Join failed"),
        }
    }

    let self_peer = PeerId::new(founding_rank, self_address);
    info!(self_peer = %self_peer, "No cluster found, founding a new one");
    ClusterState::founded(self_peer)
}
