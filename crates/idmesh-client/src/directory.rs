//! Directory client
//!
//! Locates the cluster leader among a list of known servers and sends
//! directory operations to it. Passwords are hashed with SHA-512 before they
//! leave the client; servers only ever see the hash.

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha512};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use idmesh_api::{
    model::{ListKind, PeerId, UserInfo},
    remote::{self, CreateUserRequest, DeleteUserRequest, ModifyUserRequest},
};
use idmesh_core::{FailureDetector, PeerTransport, TcpFailureDetector};

use crate::{
    error::{ClientError, Result},
    peer::{PeerClient, PeerClientConfig},
};

/// SHA-512 digest of a password
pub fn hash_password(password: &str) -> Vec<u8> {
    Sha512::digest(password.as_bytes()).to_vec()
}

/// Endpoint URL on `address`; `segment` is appended percent-encoded
fn endpoint(address: &str, service_name: &str, path: &str, segment: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(&format!("{}{}", remote::service_url(address, service_name), path))
        .map_err(|e| ClientError::Other(e.into()))?;
    if let Some(segment) = segment {
        url.path_segments_mut()
            .map_err(|_| ClientError::Other(anyhow::anyhow!("{} cannot carry a path", address)))?
            .push(segment);
    }
    Ok(url)
}

pub struct DirectoryClient {
    servers: Vec<String>,
    http: Client,
    peer: PeerClient,
    detector: TcpFailureDetector,
    config: PeerClientConfig,
}

impl DirectoryClient {
    pub fn new(servers: Vec<String>, config: PeerClientConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            servers,
            http,
            peer: PeerClient::new(config.clone())?,
            detector: TcpFailureDetector::new(config.connect_timeout),
            config,
        })
    }

    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    /// First reachable server's answer to `currentLeader()`
    pub async fn find_leader(&self) -> Result<PeerId> {
        for server in &self.servers {
            if !self.detector.is_reachable(server).await {
                debug!(server = %server, "Server unreachable");
                continue;
            }

            match self.peer.current_leader(server).await {
                Ok(leader) => {
                    debug!(leader = %leader, via = %server, "Found leader");
                    return Ok(leader);
                }
                Err(e) => warn!(server = %server, error = %e, "currentLeader failed"),
            }
        }

        Err(ClientError::NoLeader(self.servers.clone()))
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        segment: Option<&str>,
    ) -> Result<RequestBuilder> {
        let leader = self.find_leader().await?;
        let url = endpoint(&leader.address, &self.config.service_name, path, segment)?;
        Ok(self.http.request(method, url))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<remote::Result<serde_json::Value>>(&body) {
            Ok(result) if status.is_success() && result.is_success() => {
                serde_json::from_value(result.data).map_err(|e| ClientError::Other(e.into()))
            }
            Ok(result) => Err(ClientError::ServerError {
                code: result.code,
                message: result.message,
            }),
            Err(_) => Err(ClientError::ServerError {
                code: status.as_u16() as i32,
                message: body,
            }),
        }
    }

    pub async fn create(&self, login_name: &str, display_name: &str, password: &str) -> Result<Uuid> {
        let body = CreateUserRequest {
            login_name: login_name.to_string(),
            display_name: display_name.to_string(),
            credential_hash: hash_password(password),
        };
        let request = self
            .request(Method::POST, remote::DIRECTORY_USERS_PATH, None)
            .await?
            .json(&body);
        Self::send(request).await
    }

    pub async fn lookup(&self, login_name: &str) -> Result<UserInfo> {
        let request = self
            .request(Method::GET, remote::DIRECTORY_USERS_PATH, Some(login_name))
            .await?;
        Self::send(request).await
    }

    pub async fn reverse_lookup(&self, identifier: &Uuid) -> Result<UserInfo> {
        let identifier = identifier.to_string();
        let request = self
            .request(Method::GET, remote::DIRECTORY_IDS_PATH, Some(&identifier))
            .await?;
        Self::send(request).await
    }

    pub async fn modify(&self, old_login_name: &str, new_login_name: &str, password: &str) -> Result<bool> {
        let body = ModifyUserRequest {
            new_login_name: new_login_name.to_string(),
            credential_hash: hash_password(password),
        };
        let request = self
            .request(Method::PUT, remote::DIRECTORY_USERS_PATH, Some(old_login_name))
            .await?
            .json(&body);
        Self::send(request).await
    }

    pub async fn delete(&self, login_name: &str, password: &str) -> Result<bool> {
        let body = DeleteUserRequest {
            credential_hash: hash_password(password),
        };
        let request = self
            .request(Method::DELETE, remote::DIRECTORY_USERS_PATH, Some(login_name))
            .await?
            .json(&body);
        Self::send(request).await
    }

    pub async fn get(&self, kind: ListKind) -> Result<String> {
        let request = self
            .request(Method::GET, remote::DIRECTORY_LIST_PATH, None)
            .await?
            .query(&[("kind", kind.as_str())]);
        Self::send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("secret");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_password("secret"));
        assert_ne!(hash, hash_password("Secret"));
    }

    #[test]
    fn test_endpoint_encodes_login_name() {
        let url = endpoint("10.0.0.1:5181", "idmesh", remote::DIRECTORY_USERS_PATH, Some("Mary Ann")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://10.0.0.1:5181/idmesh/v1/directory/users/Mary%20Ann"
        );

        let url = endpoint("10.0.0.1:5181", "idmesh", remote::DIRECTORY_USERS_PATH, Some("José/x")).unwrap();
        assert!(url.as_str().ends_with("/directory/users/Jos%C3%A9%2Fx"));

        let url = endpoint("10.0.0.1:5181", "idmesh", remote::DIRECTORY_LIST_PATH, None).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.1:5181/idmesh/v1/directory/list");
    }

    #[tokio::test]
    async fn test_find_leader_without_servers() {
        let client = DirectoryClient::new(vec![], PeerClientConfig::default()).unwrap();
        assert!(matches!(
            client.find_leader().await,
            Err(ClientError::NoLeader(_))
        ));
    }
}
