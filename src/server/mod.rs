//! Server module

pub mod config;
pub mod hyper_server;

pub use config::ServerConfig;
pub use hyper_server::start_http_server;
