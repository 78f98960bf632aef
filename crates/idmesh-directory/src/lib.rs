//! idmesh Directory - login name / identifier mapping
//!
//! This crate provides:
//! - `DirectoryStore`: the two user maps behind one lock
//! - `CheckpointStore`: durable snapshots of the store

pub mod checkpoint;
pub mod store;

pub use checkpoint::CheckpointStore;
pub use store::DirectoryStore;
