//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every file route
//! - Wire up middleware (auth gate, request ID, tracing, metrics, security headers)
//! - Serve over plain TCP or TLS until shutdown is signalled
//!
//! # Design Decisions
//! - Auth is a route layer, so unknown paths answer 404 without a challenge
//! - Request IDs are assigned before tracing so every span carries one

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::archive::ArchiveOptions;
use crate::auth::require_basic_auth;
use crate::config::GatewayConfig;
use crate::handlers;
use crate::http::request::{RequestIdExt, UuidRequestId};
use crate::observability::metrics;
use crate::security::headers::security_headers;
use crate::storage::{LocalFs, Root, StorageError, Vfs};

/// How long in-flight TLS connections get to finish after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub fs: Arc<dyn Vfs>,
    pub root: Arc<Root>,
    pub archive: ArchiveOptions,
}

/// HTTP server for the file gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Serve `config.storage.root` from the local filesystem.
    pub fn new(config: GatewayConfig) -> Result<Self, StorageError> {
        Self::with_fs(config, Arc::new(LocalFs))
    }

    /// Serve the configured root through an arbitrary filesystem.
    pub fn with_fs(config: GatewayConfig, fs: Arc<dyn Vfs>) -> Result<Self, StorageError> {
        let root = Root::open(fs.as_ref(), &config.storage.root)?;
        tracing::info!(root = %root.path().display(), "serving directory");

        let config = Arc::new(config);
        let state = AppState {
            archive: ArchiveOptions::from(&config.archive),
            config: config.clone(),
            fs,
            root: Arc::new(root),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", get(handlers::index))
            .route("/api/list", get(handlers::list))
            .route("/download", get(handlers::download))
            .route("/download_zip", get(handlers::download_zip))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_basic_auth,
            ))
            .route_layer(middleware::from_fn(record_metrics))
            .with_state(state);

        let router = if config.security.enable_headers {
            security_headers(router)
        } else {
            router
        };

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request<Body>| {
                            tracing::info_span!(
                                "request",
                                request_id = %request.request_id(),
                                method = %request.method(),
                                path = %request.uri().path(),
                            )
                        })
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on `addr`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn record_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}
