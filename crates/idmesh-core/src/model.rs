// Core configuration models
// Typed access to application configuration for cluster coordination

use std::{path::PathBuf, time::Duration};

use idmesh_common::{DEFAULT_SERVER_PORT, DEFAULT_SERVICE_NAME, local_ip};

/// Application configuration wrapper
/// Provides access to configuration values for the node, cluster and persistence
#[derive(Clone, Debug)]
pub struct Configuration {
    pub config: config::Config,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::from_config(config::Config::default())
    }
}

impl Configuration {
    /// Create a new configuration from a Config instance
    pub fn from_config(config: config::Config) -> Self {
        Self { config }
    }

    // ===================== Server =====================

    /// Bind address (default: 0.0.0.0)
    pub fn server_address(&self) -> String {
        self.config
            .get_string("server.address")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
    }

    /// RPC port, also the port the failure detector probes (default: 5181)
    pub fn server_port(&self) -> u16 {
        self.config
            .get_int("server.port")
            .unwrap_or(DEFAULT_SERVER_PORT as i64) as u16
    }

    /// Address announced to peers (default: `{local_ip}:{port}`)
    pub fn advertise_address(&self) -> String {
        self.config
            .get_string("server.advertise-address")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("{}:{}", local_ip(), self.server_port()))
    }

    /// Well-known service name used as the URL scope (default: idmesh)
    pub fn service_name(&self) -> String {
        self.config
            .get_string("server.service-name")
            .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string())
    }

    // ===================== Cluster =====================

    /// Seed addresses probed at startup; accepts a comma separated string or a list
    pub fn cluster_seeds(&self) -> Vec<String> {
        let seeds = match self.config.get_array("cluster.seeds") {
            Ok(values) => values
                .into_iter()
                .filter_map(|v| v.into_string().ok())
                .collect::<Vec<String>>(),
            Err(_) => self
                .config
                .get_string("cluster.seeds")
                .map(|s| s.split(',').map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        };

        seeds
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Rank of a node that founds a new cluster (default: 1)
    pub fn founding_rank(&self) -> u64 {
        self.config.get_int("cluster.founding-rank").unwrap_or(1) as u64
    }

    pub fn probe_timeout_ms(&self) -> u64 {
        self.config.get_int("cluster.probe-timeout-ms").unwrap_or(500) as u64
    }

    pub fn connect_timeout_ms(&self) -> u64 {
        self.config
            .get_int("cluster.connect-timeout-ms")
            .unwrap_or(500) as u64
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.config
            .get_int("cluster.request-timeout-ms")
            .unwrap_or(3000) as u64
    }

    /// How long a node waits for `electionWon` before re-running its round (default: 5000ms)
    pub fn election_wait_ms(&self) -> u64 {
        self.config
            .get_int("cluster.election-wait-ms")
            .unwrap_or(5000) as u64
    }

    /// Unresolved rounds before an election gives up (default: 3)
    pub fn election_max_rounds(&self) -> u32 {
        self.config
            .get_int("cluster.election-max-rounds")
            .unwrap_or(3)
            .max(1) as u32
    }

    // ===================== Replication =====================

    pub fn checkpoint_interval_ms(&self) -> u64 {
        self.config
            .get_int("replication.checkpoint-interval-ms")
            .unwrap_or(5000) as u64
    }

    pub fn catch_up_interval_ms(&self) -> u64 {
        self.config
            .get_int("replication.catch-up-interval-ms")
            .unwrap_or(500) as u64
    }

    /// Checkpoint directory (default: data)
    pub fn data_dir(&self) -> PathBuf {
        self.config
            .get_string("persistence.data-dir")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"))
    }

    /// Log directory operations at info instead of debug
    pub fn verbose(&self) -> bool {
        self.config.get_bool("verbose").unwrap_or(false)
    }
}

/// Configuration for the election engine
#[derive(Clone, Debug)]
pub struct ElectionConfig {
    /// Bounded wait for an `electionWon` notification
    pub wait_timeout: Duration,
    /// Rounds before `ElectionTimeout` is surfaced
    pub max_rounds: u32,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_millis(5000),
            max_rounds: 3,
        }
    }
}

impl ElectionConfig {
    /// Create an ElectionConfig from application Configuration
    pub fn from_configuration(config: &Configuration) -> Self {
        Self {
            wait_timeout: Duration::from_millis(config.election_wait_ms()),
            max_rounds: config.election_max_rounds(),
        }
    }
}

/// Configuration for checkpoint and catch-up tasks
#[derive(Clone, Debug)]
pub struct ReplicationConfig {
    pub checkpoint_interval: Duration,
    pub catch_up_interval: Duration,
    pub data_dir: PathBuf,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: Duration::from_millis(5000),
            catch_up_interval: Duration::from_millis(500),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl ReplicationConfig {
    /// Create a ReplicationConfig from application Configuration
    pub fn from_configuration(config: &Configuration) -> Self {
        Self {
            checkpoint_interval: Duration::from_millis(config.checkpoint_interval_ms()),
            catch_up_interval: Duration::from_millis(config.catch_up_interval_ms()),
            data_dir: config.data_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration(pairs: &[(&str, &str)]) -> Configuration {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        Configuration::from_config(builder.build().unwrap())
    }

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.server_address(), "0.0.0.0");
        assert_eq!(config.server_port(), 5181);
        assert_eq!(config.service_name(), "idmesh");
        assert!(config.cluster_seeds().is_empty());
        assert_eq!(config.founding_rank(), 1);
        assert_eq!(config.probe_timeout_ms(), 500);
        assert_eq!(config.election_max_rounds(), 3);
        assert_eq!(config.data_dir(), PathBuf::from("data"));
        assert!(!config.verbose());
        assert!(config.advertise_address().ends_with(":5181"));
    }

    #[test]
    fn test_overrides() {
        let config = configuration(&[
            ("server.port", "6000"),
            ("server.advertise-address", "node-a:6000"),
            ("cluster.seeds", "node-b:6000, node-c:6000,"),
            ("cluster.election-wait-ms", "250"),
        ]);
        assert_eq!(config.server_port(), 6000);
        assert_eq!(config.advertise_address(), "node-a:6000");
        assert_eq!(config.cluster_seeds(), vec!["node-b:6000", "node-c:6000"]);

        let election = ElectionConfig::from_configuration(&config);
        assert_eq!(election.wait_timeout, Duration::from_millis(250));
        assert_eq!(election.max_rounds, 3);
    }

    #[test]
    fn test_replication_config() {
        let config = configuration(&[
            ("replication.catch-up-interval-ms", "100"),
            ("persistence.data-dir", "/var/lib/idmesh"),
        ]);
        let replication = ReplicationConfig::from_configuration(&config);
        assert_eq!(replication.catch_up_interval, Duration::from_millis(100));
        assert_eq!(replication.checkpoint_interval, Duration::from_millis(5000));
        assert_eq!(replication.data_dir, PathBuf::from("/var/lib/idmesh"));
    }
}
