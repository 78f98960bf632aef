//! idmesh Core - cluster coordination
//!
//! This crate provides:
//! - Failure detection
//! - Membership registry (join / announce)
//! - Bully leader election
//! - Leader-to-backup replication and checkpointing

pub mod metrics;
pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::{Configuration, ElectionConfig, ReplicationConfig};
pub use service::{
    ClusterState, ElectionEngine, FailureDetector, FanOutReport, MembershipRegistry,
    PeerTransport, ReplicationManager, TcpFailureDetector, fan_out,
};
