//! Error responses for the RPC surface
//!
//! Handlers return [`ApiError`]; the wrapped error decides the HTTP status and
//! the envelope code.

use std::fmt::{Display, Formatter};

use actix_web::{HttpResponse, http::StatusCode};

use idmesh_common::{
    AppError, ErrorCode, IdmeshError,
    error::{
        PARAMETER_VALIDATE_ERROR, PEER_UNREACHABLE, RESOURCE_CONFLICT, RESOURCE_NOT_FOUND,
        SERVER_ERROR,
    },
};

use crate::{metrics, model::response::http_response};

#[derive(Debug)]
pub struct ApiError(AppError);

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<IdmeshError> for ApiError {
    fn from(value: IdmeshError) -> Self {
        ApiError(value.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        ApiError(value.into())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (u16, ErrorCode<'static>) {
        match self.0.downcast_ref::<IdmeshError>() {
            Some(IdmeshError::AlreadyExists(_)) => (409, RESOURCE_CONFLICT),
            Some(IdmeshError::UserNotFound(_)) => (404, RESOURCE_NOT_FOUND),
            Some(IdmeshError::IllegalArgument(_)) => (400, PARAMETER_VALIDATE_ERROR),
            Some(IdmeshError::PeerUnreachable { .. }) => (503, PEER_UNREACHABLE),
            Some(e) => (500, e.code()),
            None => (500, SERVER_ERROR),
        }
    }
}

impl actix_web::error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        let (status, _) = self.status_and_code();
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let (status, code) = self.status_and_code();
        metrics::record_rpc_error(code.code);
        http_response(status, code.code, self.to_string(), String::new())
    }
}
