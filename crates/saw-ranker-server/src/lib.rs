pub mod api;
pub mod config;
pub mod http;
pub mod logging;
mod metrics;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use http::{HttpRequest, HttpResponse};
pub use logging::init_tracing;
pub use server::RankerServer;
