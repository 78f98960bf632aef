// Node-to-node HTTP transport
// Every failure (connect, timeout, status, body) becomes IdmeshError::PeerUnreachable

use std::time::Duration;

use reqwest::{Client, Method};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use idmesh_api::{
    model::{DirectorySnapshot, PeerId},
    remote::{self, JoinRequest, JoinResponse},
};
use idmesh_common::{DEFAULT_SERVICE_NAME, IdmeshError};
use idmesh_core::{Configuration, PeerTransport};

/// Configuration for peer RPC calls
#[derive(Clone, Debug)]
pub struct PeerClientConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// Well-known service name peers are bound under
    pub service_name: String,
}

impl Default for PeerClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(500),
            request_timeout: Duration::from_millis(3000),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

impl PeerClientConfig {
    /// Create a PeerClientConfig from application Configuration
    pub fn from_configuration(config: &Configuration) -> Self {
        Self {
            connect_timeout: Duration::from_millis(config.connect_timeout_ms()),
            request_timeout: Duration::from_millis(config.request_timeout_ms()),
            service_name: config.service_name(),
        }
    }
}

/// HTTP implementation of `PeerTransport`
#[derive(Clone, Debug)]
pub struct PeerClient {
    client: Client,
    config: PeerClientConfig,
}

impl PeerClient {
    pub fn new(config: PeerClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .no_proxy()
            .build()?;

        Ok(Self { client, config })
    }

    /// Base URL of the service bound at `address`
    pub fn service_url(&self, address: &str) -> String {
        remote::service_url(address, &self.config.service_name)
    }

    async fn call<B, T>(
        &self,
        method: Method,
        address: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, IdmeshError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.service_url(address), path);
        debug!("Peer call {} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IdmeshError::unreachable(address, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdmeshError::unreachable(
                address,
                format!("{} returned status {}", path, status),
            ));
        }

        let result: remote::Result<T> = response
            .json()
            .await
            .map_err(|e| IdmeshError::unreachable(address, e))?;
        if !result.is_success() {
            return Err(IdmeshError::unreachable(
                address,
                format!("code={}, message={}", result.code, result.message),
            ));
        }

        Ok(result.data)
    }

    async fn get<T: DeserializeOwned>(&self, address: &str, path: &str) -> Result<T, IdmeshError> {
        self.call::<(), T>(Method::GET, address, path, None).await
    }

    async fn post<B, T>(&self, address: &str, path: &str, body: &B) -> Result<T, IdmeshError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::POST, address, path, Some(body)).await
    }
}

#[async_trait::async_trait]
impl PeerTransport for PeerClient {
    async fn election_request(&self, address: &str, sender: &PeerId) -> Result<bool, IdmeshError> {
        self.post(address, remote::CLUSTER_ELECTION_REQUEST_PATH, sender)
            .await
    }

    async fn election_won(&self, address: &str, leader: &PeerId) -> Result<(), IdmeshError> {
        self.post(address, remote::CLUSTER_ELECTION_WON_PATH, leader)
            .await
    }

    async fn current_leader(&self, address: &str) -> Result<PeerId, IdmeshError> {
        self.get(address, remote::CLUSTER_LEADER_PATH).await
    }

    async fn is_alive(&self, address: &str) -> Result<bool, IdmeshError> {
        self.get(address, remote::CLUSTER_ALIVE_PATH).await
    }

    async fn join(&self, address: &str, candidate: &str) -> Result<JoinResponse, IdmeshError> {
        let request = JoinRequest {
            address: candidate.to_string(),
        };
        self.post(address, remote::CLUSTER_JOIN_PATH, &request)
            .await
    }

    async fn announce_new_peer(&self, address: &str, peer: &PeerId) -> Result<(), IdmeshError> {
        self.post(address, remote::CLUSTER_ANNOUNCE_PATH, peer)
            .await
    }

    async fn snapshot_directory(&self, address: &str) -> Result<DirectorySnapshot, IdmeshError> {
        self.get(address, remote::DIRECTORY_SNAPSHOT_PATH).await
    }
}
