//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{GatewayConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Values given on the command line or through the environment.
/// Each one that is set wins over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub secret: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut GatewayConfig) {
        if let Some(root) = self.root {
            config.storage.root = root;
        }
        if let Some(bind) = self.bind_address {
            config.listener.bind_address = bind;
        }
        if let Some(secret) = self.secret {
            config.auth.secret = secret;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the effective configuration: file (if any), then overrides, then validation.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };
    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
