//! Edge gateway: forwards the browser-facing API to the upstream service.

pub mod config;
pub mod demo;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod sessions;

pub use config::schema::GatewayConfig;
pub use forward::Forwarder;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, UpstreamSupervisor};
