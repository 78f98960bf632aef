//! Bully leader election
//!
//! A node that finds its leader unreachable asks every reachable higher-ranked
//! peer to take over. If none acknowledges, it is the highest reachable rank
//! and declares victory; otherwise it waits for the winner's `electionWon`.
//!
//! The wait is bounded by [`ElectionConfig::wait_timeout`]. An unanswered wait
//! re-runs the round, and after [`ElectionConfig::max_rounds`] rounds the
//! caller gets `IdmeshError::ElectionTimeout`. At most one round is
//! outstanding per node; concurrent triggers wait on the same completion signal,
//! and only the caller that started a round resets it after a timeout.

use std::sync::Arc;

use futures::future::join_all;
use tokio::{sync::Notify, time::timeout};
use tracing::{debug, error, info, warn};

use idmesh_api::model::{ClusterView, PeerId};
use idmesh_common::IdmeshError;

use crate::{metrics, model::ElectionConfig};

use super::{
    failure_detector::FailureDetector, fan_out::fan_out, state::SharedClusterState,
    transport::PeerTransport,
};

enum RoundOutcome {
    Won(PeerId),
    Deferred,
}

pub struct ElectionEngine {
    state: SharedClusterState,
    detector: Arc<dyn FailureDetector>,
    transport: Arc<dyn PeerTransport>,
    config: ElectionConfig,
    completed: Notify,
}

impl std::fmt::Debug for ElectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ElectionEngine")
            .field("self", state.self_peer())
            .field("leader", state.leader())
            .field("election_in_progress", &state.election_in_progress())
            .finish()
    }
}

impl ElectionEngine {
    pub fn new(
        state: SharedClusterState,
        detector: Arc<dyn FailureDetector>,
        transport: Arc<dyn PeerTransport>,
        config: ElectionConfig,
    ) -> Self {
        Self {
            state,
            detector,
            transport,
            config,
            completed: Notify::new(),
        }
    }

    pub fn self_peer(&self) -> PeerId {
        self.state.lock().self_peer().clone()
    }

    /// Leader as currently believed, without any liveness check
    pub fn believed_leader(&self) -> PeerId {
        self.state.lock().leader().clone()
    }

    pub fn is_leader(&self) -> bool {
        self.state.lock().is_leader()
    }

    pub fn election_in_progress(&self) -> bool {
        self.state.lock().election_in_progress()
    }

    pub fn view(&self) -> ClusterView {
        self.state.lock().view()
    }

    /// The leader after validating its liveness.
    ///
    /// An unreachable leader triggers an election that excludes it; the call
    /// returns once the election resolves.
    pub async fn current_leader(&self) -> Result<PeerId, IdmeshError> {
        let (leader, is_self) = {
            let state = self.state.lock();
            (state.leader().clone(), state.is_leader())
        };

        if is_self || self.detector.is_reachable(&leader.address).await {
            return Ok(leader);
        }

        warn!(leader = %leader, "Leader unreachable, starting election");
        self.elect(Some(&leader)).await
    }

    /// Run (or join) an election and wait for its result
    pub async fn elect(&self, excluded: Option<&PeerId>) -> Result<PeerId, IdmeshError> {
        for round in 1..=self.config.max_rounds {
            // Registered before the flag is inspected so a concurrent electionWon is not lost
            let notified = self.completed.notified();

            let owns_round = self.state.lock().begin_election();
            if owns_round {
                metrics::record_election_round();
                match self.run_round(excluded).await {
                    Ok(RoundOutcome::Won(leader)) => return Ok(leader),
                    Ok(RoundOutcome::Deferred) => {
                        debug!(round, "Higher-ranked peer acknowledged, waiting for electionWon");
                    }
                    Err(e) => {
                        self.state.lock().set_election_in_progress(false);
                        self.completed.notify_waiters();
                        error!(error = %e, "Election aborted");
                        return Err(e);
                    }
                }
            }

            match timeout(self.config.wait_timeout, notified).await {
                Ok(()) => {
                    let state = self.state.lock();
                    if !state.election_in_progress() {
                        return Ok(state.leader().clone());
                    }
                }
                Err(_) if owns_round => {
                    warn!(
                        round,
                        max_rounds = self.config.max_rounds,
                        "No electionWon within {:?}, retrying",
                        self.config.wait_timeout
                    );
                    self.state.lock().set_election_in_progress(false);
                }
                // The round belongs to another caller, which clears it on its own timeout
                Err(_) => debug!(round, "Still waiting on another caller's round"),
            }
        }

        metrics::record_election_timeout();
        Err(IdmeshError::ElectionTimeout {
            rounds: self.config.max_rounds,
        })
    }

    async fn run_round(&self, excluded: Option<&PeerId>) -> Result<RoundOutcome, IdmeshError> {
        let (self_peer, candidates) = {
            let state = self.state.lock();
            let candidates: Vec<PeerId> = state
                .others()
                .into_iter()
                .filter(|m| excluded.is_none_or(|e| e.address != m.address))
                .collect();
            (state.self_peer().clone(), candidates)
        };

        let highest = PeerId::highest(candidates.iter().chain(std::iter::once(&self_peer)))?;
        if highest == Some(&self_peer) {
            return Ok(RoundOutcome::Won(self.declare_victory().await));
        }

        let mut higher = Vec::new();
        for candidate in candidates {
            if candidate.outranks(&self_peer)? {
                higher.push(candidate);
            }
        }

        let requests = higher.iter().map(|peer| {
            let self_peer = &self_peer;
            async move {
                if !self.detector.is_reachable(&peer.address).await {
                    debug!(peer = %peer, "Higher-ranked peer unreachable");
                    return false;
                }
                match self.transport.election_request(&peer.address, self_peer).await {
                    Ok(acknowledged) => acknowledged,
                    Err(e) => {
                        debug!(peer = %peer, error = %e, "electionRequest failed");
                        false
                    }
                }
            }
        });
        let acknowledged = join_all(requests).await.into_iter().any(|ack| ack);

        if acknowledged {
            Ok(RoundOutcome::Deferred)
        } else {
            info!(peer = %self_peer, "No higher-ranked peer answered");
            Ok(RoundOutcome::Won(self.declare_victory().await))
        }
    }

    async fn declare_victory(&self) -> PeerId {
        let (leader, others) = {
            let mut state = self.state.lock();
            let leader = state.self_peer().clone();
            state.set_leader(leader.clone());
            state.set_election_in_progress(false);
            (leader, state.others())
        };
        self.completed.notify_waiters();

        info!(leader = %leader, "Won election");
        metrics::record_election_won();

        let transport = self.transport.clone();
        let winner = leader.clone();
        fan_out("election_won", &others, move |peer| {
            let transport = transport.clone();
            let winner = winner.clone();
            async move { transport.election_won(&peer.address, &winner).await }
        })
        .await;

        leader
    }

    /// Remote `electionRequest(sender)`.
    ///
    /// Acknowledges when this node outranks the sender and runs its own round
    /// on a spawned task; a stale request from a higher-ranked sender returns false.
    pub fn handle_election_request(self: &Arc<Self>, sender: &PeerId) -> Result<bool, IdmeshError> {
        let (self_peer, in_progress) = {
            let state = self.state.lock();
            (state.self_peer().clone(), state.election_in_progress())
        };

        if !self_peer.outranks(sender)? {
            info!(sender = %sender, "Ignoring electionRequest from a higher-ranked peer");
            return Ok(false);
        }

        if in_progress {
            debug!(sender = %sender, "Election already in progress");
            return Ok(true);
        }

        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.elect(None).await {
                warn!(error = %e, "Election started by electionRequest failed");
            }
        });

        Ok(true)
    }

    /// Remote `electionWon(newLeader)`: last writer wins
    pub fn handle_election_won(&self, leader: PeerId) {
        {
            let mut state = self.state.lock();
            state.set_leader(leader.clone());
            state.set_election_in_progress(false);
        }
        self.completed.notify_waiters();

        info!(leader = %leader, "New leader announced");
    }
}
