//! Configuration loading for an idmesh node
//!
//! Sources, lowest precedence first: built-in defaults, `conf/application.yml`
//! (optional), `IDMESH_*` environment variables, command line flags.

use clap::Parser;
use config::{Config, ConfigError, Environment};

use idmesh_core::Configuration;

use crate::startup::LoggingConfig;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(name = "idmesh-server", version, about = "Replicated login name directory node")]
pub struct Cli {
    /// RPC port
    #[arg(short = 'n', long = "port")]
    pub port: Option<u16>,

    /// Address announced to peers (host:port)
    #[arg(long = "address")]
    pub address: Option<String>,

    /// Seed node addresses probed at startup
    #[arg(short = 'i', long = "seeds", value_delimiter = ',')]
    pub seeds: Vec<String>,

    /// Checkpoint directory
    #[arg(long = "data-dir")]
    pub data_dir: Option<String>,

    /// Log directory operations at info level
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Configuration file
    #[arg(long = "config", default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: String,
}

/// Build the node configuration from every source
pub fn load_configuration(cli: &Cli) -> Result<Configuration, ConfigError> {
    let mut builder = Config::builder()
        .set_default("server.address", "0.0.0.0")?
        .add_source(config::File::with_name(&cli.config_file).required(false))
        .add_source(
            Environment::with_prefix("IDMESH")
                .separator(".")
                .try_parsing(true),
        );

    if let Some(port) = cli.port {
        builder = builder.set_override("server.port", port as i64)?;
    }
    if let Some(address) = &cli.address {
        builder = builder.set_override("server.advertise-address", address.as_str())?;
    }
    if !cli.seeds.is_empty() {
        builder = builder.set_override("cluster.seeds", cli.seeds.join(","))?;
    }
    if let Some(data_dir) = &cli.data_dir {
        builder = builder.set_override("persistence.data-dir", data_dir.as_str())?;
    }
    if cli.verbose {
        builder = builder.set_override("verbose", true)?;
    }

    Ok(Configuration::from_config(builder.build()?))
}

/// Logging settings; `IDMESH_LOG_DIR` / `IDMESH_LOG_LEVEL` win over `logging.*` keys
pub fn logging_config(configuration: &Configuration) -> LoggingConfig {
    if std::env::var_os("IDMESH_LOG_DIR").is_some() || std::env::var_os("IDMESH_LOG_LEVEL").is_some()
    {
        return LoggingConfig::from_env();
    }

    let config = &configuration.config;
    LoggingConfig::from_config(
        config.get_string("logging.dir").ok(),
        config.get_bool("logging.console").unwrap_or(true),
        config.get_bool("logging.file").unwrap_or(true),
        config
            .get_string("logging.level")
            .unwrap_or_else(|_| "info".to_string()),
    )
}
