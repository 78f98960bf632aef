//! idmesh Client - talking to idmesh nodes over HTTP
//!
//! This crate provides:
//! - `PeerClient`: the node-to-node transport used by election, membership and replication
//! - `DirectoryClient`: a leader-locating client for directory operations
//! - The `idmesh` command line tool

pub mod directory;
pub mod error;
pub mod peer;

pub use directory::{DirectoryClient, hash_password};
pub use error::{ClientError, Result};
pub use peer::{PeerClient, PeerClientConfig};
