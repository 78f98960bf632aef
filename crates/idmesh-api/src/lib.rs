//! idmesh API - cluster and directory models shared by nodes and clients
//!
//! This crate provides:
//! - Peer identity and ordering (`PeerId`)
//! - Directory records (`User`, `UserInfo`, `DirectorySnapshot`)
//! - Remote request/response bodies and route paths

pub mod model;
pub mod remote;

// Re-export commonly used types
pub use model::*;
