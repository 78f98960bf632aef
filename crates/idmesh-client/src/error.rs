//! Client error types

use idmesh_common::{IdmeshError, error};

/// Error type for directory client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned error: code={code}, message={message}")]
    ServerError { code: i32, message: String },

    #[error("no reachable leader among {0:?}")]
    NoLeader(Vec<String>),

    #[error(transparent)]
    Cluster(#[from] IdmeshError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ClientError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::ServerError { code, .. } if *code == error::RESOURCE_CONFLICT.code)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::ServerError { code, .. } if *code == error::RESOURCE_NOT_FOUND.code)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
