//! TLS configuration and certificate loading.

use axum_server::tls_rustls::RustlsConfig;
use std::io;
use std::path::Path;

use crate::config::TlsConfig;

/// Load the certificate chain and private key named by `config`.
pub async fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, io::Error> {
    for (what, path) in [("certificate", &config.cert_path), ("private key", &config.key_path)] {
        if !Path::new(path).exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} file not found: {}", what, path),
            ));
        }
    }

    RustlsConfig::from_pem_file(&config.cert_path, &config.key_path).await
}
