// Peer transport abstraction
// Every peer-to-peer call goes through this trait; failures come back as IdmeshError values

use idmesh_api::{
    model::{DirectorySnapshot, PeerId},
    remote::JoinResponse,
};
use idmesh_common::IdmeshError;

/// Bounded-timeout RPC to another node's idmesh service.
///
/// Implementations map every transport failure (refused, timeout, bad status,
/// undecodable body) to `IdmeshError::PeerUnreachable`.
#[async_trait::async_trait]
pub trait PeerTransport: Send + Sync {
    async fn election_request(&self, address: &str, sender: &PeerId) -> Result<bool, IdmeshError>;

    async fn election_won(&self, address: &str, leader: &PeerId) -> Result<(), IdmeshError>;

    async fn current_leader(&self, address: &str) -> Result<PeerId, IdmeshError>;

    async fn is_alive(&self, address: &str) -> Result<bool, IdmeshError>;

    async fn join(&self, address: &str, candidate: &str) -> Result<JoinResponse, IdmeshError>;

    async fn announce_new_peer(&self, address: &str, peer: &PeerId) -> Result<(), IdmeshError>;

    async fn snapshot_directory(&self, address: &str) -> Result<DirectorySnapshot, IdmeshError>;
}
