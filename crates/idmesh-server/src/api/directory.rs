//! Directory API handlers
//!
//! Writes and reads go to whichever node receives them; clients send them to
//! the leader, and backups converge by catch-up.

use std::str::FromStr;

use actix_web::{HttpResponse, delete, get, post, put, web};
use tracing::debug;
use uuid::Uuid;

use idmesh_api::{
    model::ListKind,
    remote::{CreateUserRequest, DeleteUserRequest, ListQuery, ModifyUserRequest},
};
use idmesh_common::IdmeshError;

use crate::{error::ApiError, model::response::http_success, node::Node};

/// POST /directory/users
#[post("/users")]
pub async fn create_user(
    node: web::Data<Node>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let identifier = node.store().create(
        &request.login_name,
        &request.display_name,
        request.credential_hash,
    )?;

    Ok(http_success(identifier))
}

/// GET /directory/users/{login_name}
#[get("/users/{login_name}")]
pub async fn lookup_user(
    node: web::Data<Node>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = node.store().lookup(&path)?;
    Ok(http_success(user.info()))
}

/// GET /directory/ids/{identifier}
#[get("/ids/{identifier}")]
pub async fn reverse_lookup_user(
    node: web::Data<Node>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let identifier = Uuid::parse_str(&path)
        .map_err(|e| IdmeshError::IllegalArgument(format!("invalid uuid '{}': {}", path, e)))?;
    let user = node.store().reverse_lookup(&identifier)?;
    Ok(http_success(user.info()))
}

/// PUT /directory/users/{old_login_name}
#[put("/users/{login_name}")]
pub async fn modify_user(
    node: web::Data<Node>,
    path: web::Path<String>,
    body: web::Json<ModifyUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let modified = node
        .store()
        .modify(&path, &body.new_login_name, &body.credential_hash);
    Ok(http_success(modified))
}

/// DELETE /directory/users/{login_name}
#[delete("/users/{login_name}")]
pub async fn delete_user(
    node: web::Data<Node>,
    path: web::Path<String>,
    body: web::Json<DeleteUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let deleted = node.store().delete(&path, &body.credential_hash);
    Ok(http_success(deleted))
}

/// GET /directory/list?kind=users|uuids|all
#[get("/list")]
pub async fn list_users(
    node: web::Data<Node>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let kind = match query.kind.as_deref() {
        Some(kind) => ListKind::from_str(kind).map_err(IdmeshError::IllegalArgument)?,
        None => ListKind::Users,
    };
    Ok(http_success(node.store().list(kind)))
}

/// POST /directory/persist
#[post("/persist")]
pub async fn persist(node: web::Data<Node>) -> Result<HttpResponse, ApiError> {
    node.replication().checkpoint().await?;
    Ok(http_success(true))
}

/// GET /directory/snapshot
#[get("/snapshot")]
pub async fn snapshot(node: web::Data<Node>) -> Result<HttpResponse, ApiError> {
    let snapshot = node.store().snapshot();
    debug!(users = snapshot.len(), "Serving directory snapshot");
    Ok(http_success(snapshot))
}
