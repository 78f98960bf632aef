//! Failure detection by bounded TCP connect
//!
//! `false` is the only failure signal: timeouts, refused connections and
//! unresolvable names all look the same to callers.

use std::time::Duration;

use tokio::{net::TcpStream, time::timeout};
use tracing::debug;

use crate::model::Configuration;

/// Liveness probe consumed by election, bootstrap and catch-up
#[async_trait::async_trait]
pub trait FailureDetector: Send + Sync {
    /// Whether the peer at `address` (`host:port`) accepts connections right now
    async fn is_reachable(&self, address: &str) -> bool;
}

/// TCP connect probe against the peer's RPC port
#[derive(Clone, Debug)]
pub struct TcpFailureDetector {
    probe_timeout: Duration,
}

impl Default for TcpFailureDetector {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(500),
        }
    }
}

impl TcpFailureDetector {
    pub fn new(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }

    pub fn from_configuration(config: &Configuration) -> Self {
        Self::new(Duration::from_millis(config.probe_timeout_ms()))
    }
}

#[async_trait::async_trait]
impl FailureDetector for TcpFailureDetector {
    async fn is_reachable(&self, address: &str) -> bool {
        match timeout(self.probe_timeout, TcpStream::connect(address)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!("TCP probe failed for {}: {}", address, e);
                false
            }
            Err(_) => {
                debug!("TCP probe timeout for {}", address);
                false
            }
        }
    }
}
