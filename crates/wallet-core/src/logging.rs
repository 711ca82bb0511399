//! Logging initialization.
//!
//! Every binary embedding this subsystem calls [`init`] (or
//! [`init_with_config`]) once at startup and uses standard `tracing`
//! macros everywhere else. Token values and key material are never
//! logged; log ids, lengths, and digests instead.

use tracing_subscriber::EnvFilter;

/// Configuration for the tracing subscriber.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Service name recorded on the initialization line.
    pub service_name: String,
    /// Default level filter when `RUST_LOG` is unset.
    pub default_level: String,
    /// Emit structured JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "wallet".into(),
            default_level: "info".into(),
            json: false,
        }
    }
}

/// Initialize logging with defaults for the given service name.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the tracing subscriber.
///
/// Level comes from `RUST_LOG` when set, otherwise from
/// `config.default_level`. Safe to call more than once; later calls are
/// no-ops.
pub fn init_with_config(config: LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let initialized = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if initialized {
        tracing::info!(service = %config.service_name, "logging initialized");
    }
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
