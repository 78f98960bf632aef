//! HTTP server setup

use std::sync::Arc;

use actix_web::{App, HttpResponse, HttpServer, dev::Server, get, middleware::Logger, web};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::{api::route::routes, node::Node};

/// GET /metrics - Prometheus text exposition
#[get("/metrics")]
pub async fn metrics_endpoint(handle: web::Data<PrometheusHandle>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(handle.render())
}

/// Creates and binds the RPC server.
///
/// Signal handling is left to the caller so the shutdown hook runs before the
/// server stops.
pub fn rpc_server(
    node: Arc<Node>,
    metrics: Option<PrometheusHandle>,
    address: String,
    port: u16,
) -> Result<Server, std::io::Error> {
    let service_name = node.configuration().service_name();

    Ok(HttpServer::new(move || {
        let mut app = App::new()
            .wrap(Logger::default())
            .app_data(web::Data::from(node.clone()))
            .service(routes(&service_name));

        if let Some(handle) = &metrics {
            app = app
                .app_data(web::Data::new(handle.clone()))
                .service(metrics_endpoint);
        }

        app
    })
    .disable_signals()
    .bind((address, port))?
    .run())
}
