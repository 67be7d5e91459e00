//! Logging configuration and initialization
//!
//! This module sets up the tracing subscriber for structured logging
//! throughout the service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system with the specified level
///
/// A `RUST_LOG` environment variable takes precedence over the configured
/// level. Unknown levels fall back to "info".
pub fn init_logging(log_level: &str) {
    let level = match log_level.trim().to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" => "error".to_string(),
        other if ["trace", "debug", "info", "warn", "error"].contains(&other) => {
            other.to_string()
        }
        _ => "info".to_string(),
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
