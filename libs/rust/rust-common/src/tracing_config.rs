//! Tracing subscriber initialization.
//!
//! Instrumented services log through `tracing`. [`init_tracing`] installs the
//! global subscriber; [`TracingConfig::service_span`] is the root span whose
//! `service` field tags every event recorded inside it.

use tracing::Span;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Value of the `service` field on the root span
    pub service_name: String,
    /// Level filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Render events as JSON lines
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "rust-service".to_string(),
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

impl TracingConfig {
    /// Load configuration from `SERVICE_NAME`, `LOG_LEVEL` and `LOG_FORMAT`.
    ///
    /// Unset variables keep their defaults; `LOG_FORMAT=json` enables JSON output.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: std::env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            json_output: std::env::var("LOG_FORMAT")
                .is_ok_and(|format| format.eq_ignore_ascii_case("json")),
        }
    }

    /// Set the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the fallback level filter.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Root span carrying the service name.
    ///
    /// Enter it (or `instrument` a future with it) so events inside are
    /// rendered with `service=<name>`.
    #[must_use]
    pub fn service_span(&self) -> Span {
        tracing::info_span!("service", service = %self.service_name)
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. JSON output
/// includes the current span, so the [`TracingConfig::service_span`] field
/// appears on every event.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let json = config
        .json_output
        .then(|| fmt::layer().json().with_current_span(true).with_span_list(false));
    let text = (!config.json_output).then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()?;

    config
        .service_span()
        .in_scope(|| tracing::info!("Tracing initialized"));
    Ok(())
}
