// Cluster coordination handlers: election, leader discovery, liveness and membership

use actix_web::{HttpResponse, get, post, web};

use idmesh_api::{model::PeerId, remote::JoinRequest};

use crate::{error::ApiError, model::response::http_success, node::Node};

#[post("/election/request")]
pub async fn election_request(
    node: web::Data<Node>,
    body: web::Json<PeerId>,
) -> Result<HttpResponse, ApiError> {
    let acknowledged = node.engine().handle_election_request(&body)?;
    Ok(http_success(acknowledged))
}

#[post("/election/won")]
pub async fn election_won(
    node: web::Data<Node>,
    body: web::Json<PeerId>,
) -> Result<HttpResponse, ApiError> {
    node.engine().handle_election_won(body.into_inner());
    Ok(http_success(()))
}

/// Current leader, after validating it is alive; may run an election first
#[get("/leader")]
pub async fn current_leader(node: web::Data<Node>) -> Result<HttpResponse, ApiError> {
    let leader = node.engine().current_leader().await?;
    Ok(http_success(leader))
}

#[get("/alive")]
pub async fn is_alive() -> Result<HttpResponse, ApiError> {
    Ok(http_success(true))
}

#[post("/join")]
pub async fn join(
    node: web::Data<Node>,
    body: web::Json<JoinRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = node.membership().join(&body.address).await?;
    Ok(http_success(response))
}

#[post("/announce")]
pub async fn announce_new_peer(
    node: web::Data<Node>,
    body: web::Json<PeerId>,
) -> Result<HttpResponse, ApiError> {
    node.membership().announce_new_peer(body.into_inner())?;
    Ok(http_success(()))
}

#[get("/members")]
pub async fn members(node: web::Data<Node>) -> Result<HttpResponse, ApiError> {
    Ok(http_success(node.engine().view()))
}
