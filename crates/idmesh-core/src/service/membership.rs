// Membership registry
// Join assigns ranks on the leader and announces newcomers to the rest of the cluster

use std::sync::Arc;

use tracing::{info, warn};

use idmesh_api::{model::PeerId, remote::JoinResponse};
use idmesh_common::IdmeshError;

use crate::metrics;

use super::{fan_out::fan_out, state::SharedClusterState, transport::PeerTransport};

pub struct MembershipRegistry {
    state: SharedClusterState,
    transport: Arc<dyn PeerTransport>,
}

impl std::fmt::Debug for MembershipRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MembershipRegistry")
            .field("self", state.self_peer())
            .field("member_count", &state.members().len())
            .finish()
    }
}

impl MembershipRegistry {
    pub fn new(state: SharedClusterState, transport: Arc<dyn PeerTransport>) -> Self {
        Self { state, transport }
    }

    pub fn members(&self) -> Vec<PeerId> {
        self.state.lock().members().to_vec()
    }

    /// Admit `candidate_address` into the cluster.
    ///
    /// The new peer gets a rank above every existing one and is announced to
    /// every other member. An address that is already a member keeps its
    /// PeerId and nothing is announced.
    pub async fn join(&self, candidate_address: &str) -> Result<JoinResponse, IdmeshError> {
        if candidate_address.trim().is_empty() {
            return Err(IdmeshError::IllegalArgument(
                "join address must not be empty".to_string(),
            ));
        }

        let (assigned, members, announce_to) = {
            let mut state = self.state.lock();

            if let Some(existing) = state.member_by_address(candidate_address) {
                info!(peer = %existing, "Known peer rejoined");
                return Ok(JoinResponse {
                    assigned: existing.clone(),
                    members: state.members().to_vec(),
                });
            }

            if !state.is_leader() {
                warn!(
                    candidate = candidate_address,
                    leader = %state.leader(),
                    "Join received by a node that is not the leader"
                );
            }

            let max_rank = state.max_rank();
            let rank = max_rank.checked_add(1).ok_or_else(|| {
                IdmeshError::Internal(format!("no rank left above {}", max_rank))
            })?;
            let assigned = PeerId::new(rank, candidate_address);
            state.add_member(assigned.clone())?;

            let announce_to: Vec<PeerId> = state
                .others()
                .into_iter()
                .filter(|m| m.address != assigned.address)
                .collect();
            (assigned, state.members().to_vec(), announce_to)
        };

        info!(peer = %assigned, "Peer joined");
        metrics::set_cluster_members(members.len());

        let transport = self.transport.clone();
        let new_peer = assigned.clone();
        fan_out("announce_new_peer", &announce_to, move |peer| {
            let transport = transport.clone();
            let new_peer = new_peer.clone();
            async move { transport.announce_new_peer(&peer.address, &new_peer).await }
        })
        .await;

        Ok(JoinResponse { assigned, members })
    }

    /// Record a peer announced by the leader; idempotent
    pub fn announce_new_peer(&self, peer: PeerId) -> Result<bool, IdmeshError> {
        let mut state = self.state.lock();
        let added = state.add_member(peer.clone())?;
        if added {
            info!(peer = %peer, "Learned of new peer");
            metrics::set_cluster_members(state.members().len());
        }
        Ok(added)
    }
}
