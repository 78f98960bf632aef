//! Route configuration for the idmesh RPC surface
//!
//! Every route lives under `/{service_name}/v1`.

use actix_web::{Scope, web};

use idmesh_api::remote::API_VERSION;

use super::{cluster, directory};

/// Directory routes
///
/// Routes:
/// - POST /directory/users - Create a user
/// - GET /directory/users/{login_name} - Look up a user
/// - PUT /directory/users/{login_name} - Rename a user
/// - DELETE /directory/users/{login_name} - Delete a user
/// - GET /directory/ids/{identifier} - Look up a user by UUID
/// - GET /directory/list - List login names, UUIDs or both
/// - POST /directory/persist - Write a checkpoint now
/// - GET /directory/snapshot - Full directory snapshot for catch-up
pub fn directory_routes() -> Scope {
    web::scope("/directory")
        .service(directory::create_user)
        .service(directory::lookup_user)
        .service(directory::modify_user)
        .service(directory::delete_user)
        .service(directory::reverse_lookup_user)
        .service(directory::list_users)
        .service(directory::persist)
        .service(directory::snapshot)
}

/// Cluster routes
///
/// Routes:
/// - POST /cluster/election/request - Ask a higher-ranked peer to take over
/// - POST /cluster/election/won - Announce a new leader
/// - GET /cluster/leader - Current (validated) leader
/// - GET /cluster/alive - Liveness
/// - POST /cluster/join - Join through the leader
/// - POST /cluster/announce - Learn about a newly joined peer
/// - GET /cluster/members - Cluster view
pub fn cluster_routes() -> Scope {
    web::scope("/cluster")
        .service(cluster::election_request)
        .service(cluster::election_won)
        .service(cluster::current_leader)
        .service(cluster::is_alive)
        .service(cluster::join)
        .service(cluster::announce_new_peer)
        .service(cluster::members)
}

/// All routes, scoped under the well-known service name
pub fn routes(service_name: &str) -> Scope {
    web::scope(&format!("/{}/{}", service_name, API_VERSION))
        .service(directory_routes())
        .service(cluster_routes())
}
