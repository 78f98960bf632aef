// Per-node cluster state
// Shared by the membership registry and the election engine behind a single lock

use std::sync::Arc;

use parking_lot::Mutex;

use idmesh_api::model::{ClusterView, PeerId};
use idmesh_common::IdmeshError;

pub type SharedClusterState = Arc<Mutex<ClusterState>>;

/// Volatile view of the cluster held by one node
#[derive(Clone, Debug)]
pub struct ClusterState {
    self_peer: PeerId,
    leader: PeerId,
    election_in_progress: bool,
    members: Vec<PeerId>,
}

impl ClusterState {
    /// State of a node founding a new cluster: it is the only member and the leader
    pub fn founded(self_peer: PeerId) -> Self {
        Self {
            leader: self_peer.clone(),
            members: vec![self_peer.clone()],
            self_peer,
            election_in_progress: false,
        }
    }

    /// State of a node that joined through `leader`
    pub fn joined(self_peer: PeerId, leader: PeerId, members: Vec<PeerId>) -> Self {
        let mut state = Self {
            self_peer: self_peer.clone(),
            leader,
            election_in_progress: false,
            members,
        };
        if !state.members.iter().any(|m| m.address == self_peer.address) {
            state.members.push(self_peer);
        }
        state
    }

    pub fn shared(self) -> SharedClusterState {
        Arc::new(Mutex::new(self))
    }

    pub fn self_peer(&self) -> &PeerId {
        &self.self_peer
    }

    pub fn leader(&self) -> &PeerId {
        &self.leader
    }

    pub fn is_leader(&self) -> bool {
        self.leader == self.self_peer
    }

    pub fn election_in_progress(&self) -> bool {
        self.election_in_progress
    }

    pub fn members(&self) -> &[PeerId] {
        &self.members
    }

    /// Members other than this node
    pub fn others(&self) -> Vec<PeerId> {
        self.members
            .iter()
            .filter(|m| m.address != self.self_peer.address)
            .cloned()
            .collect()
    }

    pub(crate) fn set_leader(&mut self, leader: PeerId) {
        self.leader = leader;
    }

    pub(crate) fn set_election_in_progress(&mut self, in_progress: bool) {
        self.election_in_progress = in_progress;
    }

    /// Claim the in-progress flag; false when a round is already outstanding
    pub(crate) fn begin_election(&mut self) -> bool {
        if self.election_in_progress {
            false
        } else {
            self.election_in_progress = true;
            true
        }
    }

    /// Highest rank in the set, 0 when empty
    pub fn max_rank(&self) -> u64 {
        self.members.iter().map(|m| m.rank).max().unwrap_or(0)
    }

    pub fn member_by_address(&self, address: &str) -> Option<&PeerId> {
        self.members.iter().find(|m| m.address == address)
    }

    /// Add `peer` unless already present.
    ///
    /// Returns whether the set changed. A known address that comes back with a
    /// new rank is reassigned; a rank held by another address is a `RankConflict`.
    pub fn add_member(&mut self, peer: PeerId) -> Result<bool, IdmeshError> {
        for member in &self.members {
            if member.address != peer.address {
                member.compare(&peer)?;
            }
        }

        match self
            .members
            .iter_mut()
            .find(|m| m.address == peer.address)
        {
            Some(existing) if existing.rank == peer.rank => Ok(false),
            Some(existing) => {
                existing.rank = peer.rank;
                if self.self_peer.address == peer.address {
                    self.self_peer.rank = peer.rank;
                }
                Ok(true)
            }
            None => {
                self.members.push(peer);
                Ok(true)
            }
        }
    }

    pub fn view(&self) -> ClusterView {
        ClusterView {
            self_peer: self.self_peer.clone(),
            leader: self.leader.clone(),
            election_in_progress: self.election_in_progress,
            members: self.members.clone(),
        }
    }
}
