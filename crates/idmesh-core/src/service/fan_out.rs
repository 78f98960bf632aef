//! Best-effort fan-out to a set of peers
//!
//! Each peer is called independently and concurrently. Individual failures are
//! logged and counted, never propagated.

use std::future::Future;

use futures::future::join_all;
use tracing::debug;

use idmesh_api::model::PeerId;
use idmesh_common::IdmeshError;

use crate::metrics;

/// Outcome of one fan-out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub attempted: usize,
    pub succeeded: usize,
}

impl FanOutReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Invoke `op` once per peer and report how many calls succeeded
pub async fn fan_out<F, Fut, T>(operation: &str, peers: &[PeerId], op: F) -> FanOutReport
where
    F: Fn(PeerId) -> Fut,
    Fut: Future<Output = Result<T, IdmeshError>>,
{
    let calls = peers.iter().map(|peer| {
        let call = op(peer.clone());
        async move { (peer, call.await) }
    });

    let mut report = FanOutReport {
        attempted: peers.len(),
        succeeded: 0,
    };
    for (peer, result) in join_all(calls).await {
        match result {
            Ok(_) => report.succeeded += 1,
            Err(e) => {
                debug!(operation, peer = %peer, error = %e, "Fan-out call failed");
                metrics::record_fan_out_failure(operation);
            }
        }
    }

    if report.attempted > 0 {
        debug!(
            operation,
            attempted = report.attempted,
            succeeded = report.succeeded,
            "Fan-out finished"
        );
    }
    report
}
