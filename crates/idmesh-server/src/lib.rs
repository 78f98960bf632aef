//! idmesh Server - a replicated login name directory node
//!
//! This crate provides:
//! - The RPC surface (`api`) every node exposes to clients and peers
//! - `Node`, the composition root, and bootstrap discovery
//! - Startup utilities: configuration, logging, HTTP server, shutdown

pub mod api;
pub mod error;
pub mod metrics;
pub mod model;
pub mod node;
pub mod startup;

pub use error::ApiError;
pub use node::{Node, discover_cluster};
