// Core services for cluster coordination

pub mod election;
pub mod failure_detector;
pub mod fan_out;
pub mod membership;
pub mod replication;
pub mod state;
pub mod transport;

// Re-export commonly used types
pub use election::ElectionEngine;
pub use failure_detector::{FailureDetector, TcpFailureDetector};
pub use fan_out::{FanOutReport, fan_out};
pub use membership::MembershipRegistry;
pub use replication::ReplicationManager;
pub use state::ClusterState;
pub use transport::PeerTransport;
