//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All errors are
//! collected rather than stopping at the first.

use axum::http::Uri;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),
    #[error("upstream.origin `{0}` must be an http:// origin without a path")]
    Origin(String),
    #[error("upstream.api_prefix `{0}` must start with `/` and not end with `/`")]
    ApiPrefix(String),
    #[error("upstream.max_body_bytes must be greater than zero")]
    MaxBodyBytes,
    #[error("upstream.timeout_secs must be greater than zero when set")]
    Timeout,
    #[error("supervisor.command must not be empty when the supervisor is enabled")]
    EmptyCommand,
    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if !is_http_origin(&config.upstream.origin) {
        errors.push(ValidationError::Origin(config.upstream.origin.clone()));
    }

    let prefix = &config.upstream.api_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::ApiPrefix(prefix.clone()));
    }

    if config.upstream.max_body_bytes == 0 {
        errors.push(ValidationError::MaxBodyBytes);
    }

    if config.upstream.timeout_secs == Some(0) {
        errors.push(ValidationError::Timeout);
    }

    if config.supervisor.enabled && config.supervisor.command.trim().is_empty() {
        errors.push(ValidationError::EmptyCommand);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
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

fn is_http_origin(origin: &str) -> bool {
    if origin.ends_with('/') {
        return false;
    }
    match origin.parse::<Uri>() {
        Ok(uri) => {
            uri.scheme_str() == Some("http")
                && uri.authority().is_some()
                && matches!(uri.path(), "" | "/")
                && uri.query().is_none()
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.origin = "https://127.0.0.1:8000".into();
        config.upstream.api_prefix = "api/".into();
        config.upstream.timeout_secs = Some(0);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Timeout));
    }

    #[test]
    fn origin_must_not_carry_a_path() {
        assert!(is_http_origin("http://127.0.0.1:8000"));
        assert!(!is_http_origin("http://127.0.0.1:8000/"));
        assert!(!is_http_origin("http://127.0.0.1:8000/api"));
        assert!(!is_http_origin("127.0.0.1:8000"));
    }

    #[test]
    fn disabled_supervisor_may_have_empty_command() {
        let mut config = GatewayConfig::default();
        config.supervisor.enabled = false;
        config.supervisor.command.clear();
        assert!(validate_config(&config).is_ok());
    }
}
