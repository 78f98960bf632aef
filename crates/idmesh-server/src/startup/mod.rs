//! Node startup: logging, HTTP server and shutdown handling

mod http;
mod logging;
mod shutdown;

pub use http::{metrics_endpoint, rpc_server};
pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};
pub use shutdown::{serve_until, shutdown_signal};
