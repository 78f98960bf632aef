use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use idmesh_server::{
    Node, metrics,
    model::config::{Cli, load_configuration, logging_config},
    startup::{init_logging, rpc_server, serve_until, shutdown_signal},
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let configuration = load_configuration(&cli)?;

    let _logging_guard = init_logging(&logging_config(&configuration))
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let metrics_handle = match metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            error!(error = %e, "Failed to install metrics recorder");
            None
        }
    };

    let address = configuration.server_address();
    let port = configuration.server_port();

    let node = Arc::new(Node::bootstrap(configuration).await?);
    let server = rpc_server(node.clone(), metrics_handle, address.clone(), port)?;
    let server_handle = server.handle();

    node.start().await;
    info!(address = %address, port, "idmesh node listening");

    if let Some(result) = serve_until(server, shutdown_signal()).await {
        result?;
    }

    node.shutdown().await;
    server_handle.stop(true).await;
    info!("idmesh node stopped");

    Ok(())
}
