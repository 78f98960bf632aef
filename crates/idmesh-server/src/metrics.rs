// Node metrics: installs the Prometheus recorder and describes RPC metrics

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global recorder and describe every node metric
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    idmesh_core::metrics::init_metrics();
    describe_counter!("rpc_errors_total", "RPC requests answered with an error envelope");

    Ok(handle)
}

pub fn record_rpc_error(code: i32) {
    counter!("rpc_errors_total", "code" => code.to_string()).increment(1);
}
