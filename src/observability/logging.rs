//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (text or JSON)
//! - Compose the one-line access log for API requests
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Access lines go to the `access` target so they can be filtered alone

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Longest access line, in characters, before truncation.
pub const MAX_ACCESS_LINE: usize = 80;

/// JSON body written downstream, attached to the response for the access log.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedJson(pub serde_json::Value);

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},hyper=warn,hyper_util=warn,tower_http=warn",
            config.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

/// `<METHOD> <path> <status> in <ms>ms[ :: <json>]`, cut to [`MAX_ACCESS_LINE`].
pub fn access_line(
    method: &str,
    path: &str,
    status: u16,
    elapsed_ms: u128,
    body: Option<&serde_json::Value>,
) -> String {
    let mut line = format!("{method} {path} {status} in {elapsed_ms}ms");
    if let Some(body) = body {
        line.push_str(" :: ");
        line.push_str(&body.to_string());
    }
    truncate_line(line)
}

/// Keep lines up to [`MAX_ACCESS_LINE`] characters; longer ones become
/// their first `MAX_ACCESS_LINE - 1` characters and `…`.
pub fn truncate_line(line: String) -> String {
    if line.chars().count() <= MAX_ACCESS_LINE {
        return line;
    }
    let mut cut: String = line.chars().take(MAX_ACCESS_LINE - 1).collect();
    cut.push('…');
    cut
}
