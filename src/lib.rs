//! Password-gated HTTP file gateway library

pub mod archive;
pub mod auth;
pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;
pub mod storage;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
