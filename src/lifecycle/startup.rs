//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Open the served root
//! - Bind the listener (plain or TLS) and serve until shutdown
//!
//! # Design Decisions
//! - Expects an already validated config
//! - Subsystems initialize in order, not concurrently

use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use super::Shutdown;
use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::net::load_tls_config;
use crate::observability::metrics;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot serve root: {0}")]
    Root(#[from] StorageError),

    #[error("invalid address {addr}: {reason}")]
    Address { addr: String, reason: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to load TLS material: {0}")]
    Tls(#[source] io::Error),

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Bring the gateway up and serve until `shutdown` fires.
pub async fn serve(config: GatewayConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(parse_addr(&config.observability.metrics_address)?);
    }

    let bind_address = config.listener.bind_address.clone();
    let tls = config.listener.tls.clone();
    let server = HttpServer::new(config)?;

    match tls {
        Some(tls) => {
            let addr = parse_addr(&bind_address)?;
            let tls = load_tls_config(&tls).await.map_err(StartupError::Tls)?;
            server
                .run_tls(addr, tls, shutdown.subscribe())
                .await
                .map_err(StartupError::Serve)
        }
        None => {
            let listener = TcpListener::bind(&bind_address)
                .await
                .map_err(|source| StartupError::Bind {
                    addr: bind_address.clone(),
                    source,
                })?;
            tracing::info!(address = %listener.local_addr().map_err(StartupError::Serve)?, "Listening for connections");
            server
                .run(listener, shutdown.subscribe())
                .await
                .map_err(StartupError::Serve)
        }
    }
}

fn parse_addr(addr: &str) -> Result<SocketAddr, StartupError> {
    addr.parse().map_err(|e: std::net::AddrParseError| StartupError::Address {
        addr: addr.to_string(),
        reason: e.to_string(),
    })
}
