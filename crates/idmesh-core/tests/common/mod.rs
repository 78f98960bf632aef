//! In-process cluster wiring for integration tests
//!
//! Every node registers with an `InMemoryNetwork`, which acts as both the
//! failure detector and the peer transport. Nodes can be marked down, or mute
//! (acknowledge election requests but never act on them).

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use parking_lot::RwLock;

use idmesh_api::{
    model::{DirectorySnapshot, PeerId},
    remote::JoinResponse,
};
use idmesh_common::IdmeshError;
use idmesh_core::{
    ClusterState, ElectionConfig, ElectionEngine, FailureDetector, MembershipRegistry,
    PeerTransport,
};
use idmesh_directory::DirectoryStore;

pub struct TestNode {
    pub engine: Arc<ElectionEngine>,
    pub membership: Arc<MembershipRegistry>,
    pub store: Arc<DirectoryStore>,
}

impl TestNode {
    pub fn self_peer(&self) -> PeerId {
        self.engine.self_peer()
    }

    pub fn leader(&self) -> PeerId {
        self.engine.believed_leader()
    }
}

#[derive(Default)]
pub struct InMemoryNetwork {
    nodes: RwLock<HashMap<String, Arc<TestNode>>>,
    down: RwLock<HashSet<String>>,
    mute: RwLock<HashSet<String>>,
    calls: AtomicUsize,
}

pub fn test_election_config() -> ElectionConfig {
    ElectionConfig {
        wait_timeout: Duration::from_millis(300),
        max_rounds: 3,
    }
}

impl InMemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_node(self: &Arc<Self>, state: ClusterState) -> Arc<TestNode> {
        self.add_node_with_config(state, test_election_config())
    }

    pub fn add_node_with_config(
        self: &Arc<Self>,
        state: ClusterState,
        config: ElectionConfig,
    ) -> Arc<TestNode> {
        let address = state.self_peer().address.clone();
        let shared = state.shared();
        let detector: Arc<dyn FailureDetector> = self.clone();
        let transport: Arc<dyn PeerTransport> = self.clone();

        let node = Arc::new(TestNode {
            engine: Arc::new(ElectionEngine::new(
                shared.clone(),
                detector,
                transport.clone(),
                config,
            )),
            membership: Arc::new(MembershipRegistry::new(shared, transport)),
            store: Arc::new(DirectoryStore::new()),
        });
        self.nodes.write().insert(address, node.clone());
        node
    }

    /// A cluster of `ranks` where every node knows every member and believes `leader_rank` leads
    pub fn cluster(self: &Arc<Self>, ranks: &[u64], leader_rank: u64) -> Vec<Arc<TestNode>> {
        let members: Vec<PeerId> = ranks.iter().map(|r| peer(*r)).collect();
        ranks
            .iter()
            .map(|r| {
                self.add_node(ClusterState::joined(
                    peer(*r),
                    peer(leader_rank),
                    members.clone(),
                ))
            })
            .collect()
    }

    pub fn set_down(&self, address: &str, down: bool) {
        if down {
            self.down.write().insert(address.to_string());
        } else {
            self.down.write().remove(address);
        }
    }

    pub fn set_mute(&self, address: &str) {
        self.mute.write().insert(address.to_string());
    }

    /// Number of transport calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn node(&self, address: &str) -> Result<Arc<TestNode>, IdmeshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.read().contains(address) {
            return Err(IdmeshError::unreachable(address, "connection refused"));
        }
        self.nodes
            .read()
            .get(address)
            .cloned()
            .ok_or_else(|| IdmeshError::unreachable(address, "no such host"))
    }
}

#[async_trait::async_trait]
impl FailureDetector for InMemoryNetwork {
    async fn is_reachable(&self, address: &str) -> bool {
        !self.down.read().contains(address) && self.nodes.read().contains_key(address)
    }
}

#[async_trait::async_trait]
impl PeerTransport for InMemoryNetwork {
    async fn election_request(&self, address: &str, sender: &PeerId) -> Result<bool, IdmeshError> {
        let node = self.node(address)?;
        if self.mute.read().contains(address) {
            return Ok(true);
        }
        node.engine.handle_election_request(sender)
    }

    async fn election_won(&self, address: &str, leader: &PeerId) -> Result<(), IdmeshError> {
        let node = self.node(address)?;
        if self.mute.read().contains(address) {
            return Ok(());
        }
        node.engine.handle_election_won(leader.clone());
        Ok(())
    }

    async fn current_leader(&self, address: &str) -> Result<PeerId, IdmeshError> {
        let node = self.node(address)?;
        node.engine.current_leader().await
    }

    async fn is_alive(&self, address: &str) -> Result<bool, IdmeshError> {
        self.node(address).map(|_| true)
    }

    async fn join(&self, address: &str, candidate: &str) -> Result<JoinResponse, IdmeshError> {
        let node = self.node(address)?;
        node.membership.join(candidate).await
    }

    async fn announce_new_peer(&self, address: &str, peer: &PeerId) -> Result<(), IdmeshError> {
        let node = self.node(address)?;
        node.membership.announce_new_peer(peer.clone()).map(|_| ())
    }

    async fn snapshot_directory(&self, address: &str) -> Result<DirectorySnapshot, IdmeshError> {
        let node = self.node(address)?;
        Ok(node.store.snapshot())
    }
}

pub fn address(rank: u64) -> String {
    format!("10.0.0.{}:5181", rank)
}

pub fn peer(rank: u64) -> PeerId {
    PeerId::new(rank, address(rank))
}

/// Poll `condition` until it holds or `limit` elapses
pub async fn eventually<F>(limit: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
