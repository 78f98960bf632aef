//! Error types and error codes for idmesh
//!
//! This module defines:
//! - `IdmeshError`: Application-specific error enum
//! - `AppError`: Wrapper for integration with web frameworks
//! - `ErrorCode`: Structured error codes for API responses

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum IdmeshError {
    #[error("login name '{0}' already exists")]
    AlreadyExists(String),

    #[error("user '{0}' not exist!")]
    UserNotFound(String),

    #[error("peer {address} unreachable: {reason}")]
    PeerUnreachable { address: String, reason: String },

    #[error("rank {rank} claimed by two distinct peers: {left} and {right}")]
    RankConflict {
        rank: u64,
        left: String,
        right: String,
    },

    #[error("election unresolved after {rounds} rounds")]
    ElectionTimeout { rounds: u32 },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IdmeshError {
    pub fn unreachable(address: impl Into<String>, reason: impl ToString) -> Self {
        IdmeshError::PeerUnreachable {
            address: address.into(),
            reason: reason.to_string(),
        }
    }

    /// Fatal errors mean cluster correctness can no longer be guaranteed
    pub fn is_fatal(&self) -> bool {
        matches!(self, IdmeshError::RankConflict { .. })
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, IdmeshError::PeerUnreachable { .. })
    }

    /// The error code reported in API responses
    pub fn code(&self) -> ErrorCode<'static> {
        match self {
            IdmeshError::AlreadyExists(_) => RESOURCE_CONFLICT,
            IdmeshError::UserNotFound(_) => RESOURCE_NOT_FOUND,
            IdmeshError::PeerUnreachable { .. } => PEER_UNREACHABLE,
            IdmeshError::RankConflict { .. } => RANK_CONFLICT,
            IdmeshError::ElectionTimeout { .. } => ELECTION_TIMEOUT,
            IdmeshError::Persistence(_) => DATA_ACCESS_ERROR,
            IdmeshError::IllegalArgument(_) => PARAMETER_VALIDATE_ERROR,
            IdmeshError::Internal(_) => SERVER_ERROR,
        }
    }
}

/// Wrapper for application errors
#[derive(Debug)]
pub struct AppError {
    inner: anyhow::Error,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError { inner: value }
    }
}

impl From<IdmeshError> for AppError {
    fn from(value: IdmeshError) -> Self {
        AppError {
            inner: anyhow::Error::new(value),
        }
    }
}

impl AppError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

pub const PEER_UNREACHABLE: ErrorCode<'static> = ErrorCode {
    code: 30001,
    message: "peer unreachable",
};

pub const RANK_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 30002,
    message: "rank conflict",
};

pub const ELECTION_TIMEOUT: ErrorCode<'static> = ErrorCode {
    code: 30003,
    message: "election timeout",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IdmeshError::AlreadyExists("alice".to_string());
        assert_eq!(err.to_string(), "login name 'alice' already exists");

        let err = IdmeshError::unreachable("10.0.0.2:5181", "connection refused");
        assert_eq!(
            err.to_string(),
            "peer 10.0.0.2:5181 unreachable: connection refused"
        );

        let err = IdmeshError::RankConflict {
            rank: 3,
            left: "a:1".to_string(),
            right: "b:1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "rank 3 claimed by two distinct peers: a:1 and b:1"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(
            IdmeshError::RankConflict {
                rank: 1,
                left: "a".to_string(),
                right: "b".to_string()
            }
            .is_fatal()
        );
        assert!(!IdmeshError::UserNotFound("bob".to_string()).is_fatal());
        assert!(IdmeshError::unreachable("x", "timeout").is_unreachable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            IdmeshError::AlreadyExists("a".to_string()).code(),
            RESOURCE_CONFLICT
        );
        assert_eq!(
            IdmeshError::UserNotFound("a".to_string()).code(),
            RESOURCE_NOT_FOUND
        );
        assert_eq!(
            IdmeshError::ElectionTimeout { rounds: 3 }.code().code,
            30003
        );
    }

    #[test]
    fn test_app_error_downcast() {
        let app_error: AppError = IdmeshError::UserNotFound("carol".to_string()).into();
        assert!(matches!(
            app_error.downcast_ref::<IdmeshError>(),
            Some(IdmeshError::UserNotFound(_))
        ));
        assert_eq!(app_error.to_string(), "user 'carol' not exist!");
    }
}
