//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (compression level, addresses)
//! - Check that referenced paths exist on disk
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("auth.secret must be set")]
    MissingSecret,

    #[error("storage.root '{0}' is not an existing directory")]
    Root(String),

    #[error("storage.index_file '{0}' must be a plain file name")]
    IndexFile(String),

    #[error("archive.compression_level {0} is outside 0..=9")]
    CompressionLevel(i64),

    #[error("archive.staging_dir '{0}' is not an existing directory")]
    StagingDir(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("TLS file not found: {0}")]
    TlsFile(String),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        for file in [&tls.cert_path, &tls.key_path] {
            if !Path::new(file).is_file() {
                errors.push(ValidationError::TlsFile(file.clone()));
            }
        }
    }

    if config.auth.secret.is_empty() {
        errors.push(ValidationError::MissingSecret);
    }

    if !config.storage.root.is_dir() {
        errors.push(ValidationError::Root(
            config.storage.root.display().to_string(),
        ));
    }

    if !is_plain_file_name(&config.storage.index_file) {
        errors.push(ValidationError::IndexFile(config.storage.index_file.clone()));
    }

    if let Some(level) = config.archive.compression_level {
        if !(0..=9).contains(&level) {
            errors.push(ValidationError::CompressionLevel(level));
        }
    }

    if let Some(dir) = &config.archive.staging_dir {
        if !dir.is_dir() {
            errors.push(ValidationError::StagingDir(dir.display().to_string()));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}
