//! Remote request/response bodies shared by the server and its clients
//!
//! Every route lives under `/{service_name}/v1`; the path constants below are
//! relative to that scope.

use serde::{Deserialize, Serialize};

use crate::model::PeerId;

pub const API_VERSION: &str = "v1";

pub const DIRECTORY_USERS_PATH: &str = "/directory/users";
pub const DIRECTORY_IDS_PATH: &str = "/directory/ids";
pub const DIRECTORY_LIST_PATH: &str = "/directory/list";
pub const DIRECTORY_PERSIST_PATH: &str = "/directory/persist";
pub const DIRECTORY_SNAPSHOT_PATH: &str = "/directory/snapshot";

pub const CLUSTER_ELECTION_REQUEST_PATH: &str = "/cluster/election/request";
pub const CLUSTER_ELECTION_WON_PATH: &str = "/cluster/election/won";
pub const CLUSTER_LEADER_PATH: &str = "/cluster/leader";
pub const CLUSTER_ALIVE_PATH: &str = "/cluster/alive";
pub const CLUSTER_JOIN_PATH: &str = "/cluster/join";
pub const CLUSTER_ANNOUNCE_PATH: &str = "/cluster/announce";
pub const CLUSTER_MEMBERS_PATH: &str = "/cluster/members";

/// Base URL of the idmesh service bound at `address` under `service_name`
pub fn service_url(address: &str, service_name: &str) -> String {
    format!("http://{}/{}/{}", address, service_name, API_VERSION)
}

/// Generic result wrapper for API responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Result<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> Result<T> {
    pub fn new(code: i32, message: String, data: T) -> Self {
        Result::<T> {
            code,
            message,
            data,
        }
    }

    pub fn success(data: T) -> Result<T> {
        Result::<T> {
            code: 0,
            message: "success".to_string(),
            data,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub login_name: String,
    pub display_name: String,
    #[serde(with = "base64_bytes")]
    pub credential_hash: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyUserRequest {
    pub new_login_name: String,
    #[serde(with = "base64_bytes")]
    pub credential_hash: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    #[serde(with = "base64_bytes")]
    pub credential_hash: Vec<u8>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinRequest {
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JoinResponse {
    pub assigned: PeerId,
    pub members: Vec<PeerId>,
}

/// Serde adapter carrying raw bytes as standard base64 text
pub mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)
    }
}
