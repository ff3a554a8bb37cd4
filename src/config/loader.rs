//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read configuration from a TOML file. Validation happens in [`resolve_config`],
/// once overrides are applied.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Command-line and environment values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind_address: Option<String>,
    /// Value of the `PORT` environment variable; used when `bind_address` is unset.
    pub port: Option<String>,
    pub upstream_origin: Option<String>,
    pub disable_supervisor: bool,
}

/// Build the effective configuration: file (or defaults), then overrides,
/// validated once at the end.
pub fn resolve_config(path: Option<&Path>, overrides: &Overrides) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    if let Some(bind) = &overrides.bind_address {
        config.listener.bind_address = bind.clone();
    } else if let Some(port) = &overrides.port {
        config.listener.bind_address = format!("0.0.0.0:{}", port.trim());
    }
    if let Some(origin) = &overrides.upstream_origin {
        config.upstream.origin = origin.clone();
    }
    if overrides.disable_supervisor {
        config.supervisor.enabled = false;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}
