//! idmesh Common - Shared error types and utilities
//!
//! This crate provides the foundational types used across all idmesh components:
//! - Error taxonomy and error codes
//! - Utility functions

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{AppError, ErrorCode, IdmeshError};
pub use utils::local_ip;

/// Default well-known service name every node registers its RPC surface under
pub const DEFAULT_SERVICE_NAME: &str = "idmesh";

/// Default RPC port
pub const DEFAULT_SERVER_PORT: u16 = 5181;
