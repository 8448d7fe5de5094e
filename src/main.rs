//! File gateway
//!
//! Serves one directory tree over HTTP behind a shared password.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ auth gate ─▶ handler
//!                                                           │
//!                                        ┌──────────────────┼──────────────────┐
//!                                        ▼                  ▼                  ▼
//!                                    /api/list     /download, /       /download_zip
//!                                        │                  │                  │
//!                                        └────────▶ storage (safe_path) ◀──────┘
//!                                                           │                  │
//!     Client Response                                       ▼                  ▼
//!     ◀────────────── streamed body ◀───────────────── file reader      staged zip
//! ```

use clap::Parser;
use std::path::PathBuf;

use file_gateway::config::{resolve_config, ConfigOverrides, LogFormat};
use file_gateway::lifecycle::{self, signals::spawn_signal_listener, Shutdown};
use file_gateway::observability::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "file-gateway", version)]
#[command(about = "Serve a directory over HTTP behind a shared password")]
struct Args {
    /// TOML config file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory to serve.
    #[arg(long, env = "GATEWAY_ROOT")]
    root: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080.
    #[arg(long, env = "GATEWAY_BIND")]
    bind: Option<String>,

    /// Shared password.
    #[arg(long, env = "GATEWAY_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Log output format: pretty or json.
    #[arg(long, env = "GATEWAY_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(
        args.config.as_deref(),
        ConfigOverrides {
            root: args.root,
            bind_address: args.bind,
            secret: args.secret,
            log_format: args.log_format,
        },
    )?;

    init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        root = %config.storage.root.display(),
        tls = config.listener.tls.is_some(),
        "file-gateway starting"
    );

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());
    lifecycle::serve(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
