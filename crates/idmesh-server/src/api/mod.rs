//! RPC surface: directory operations and cluster coordination

pub mod cluster;
pub mod directory;
pub mod route;
