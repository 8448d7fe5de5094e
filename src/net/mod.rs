//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Listener config
//!     → plain TCP: tokio listener handed to the HTTP layer
//!     → TLS: tls.rs loads the PEM pair, axum-server terminates TLS
//! ```

pub mod tls;

pub use tls::load_tls_config;
