use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::CoreError;

/// Console logging setup for applications embedding the core.
///
/// The library itself only emits `tracing` events; nothing is printed
/// unless the host installs a subscriber (this one or its own).
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `stock_dashboard_core=debug`
    pub log_level: String,
    /// Include the event target (module path) in each line
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Level from `RUST_LOG`, falling back to `info`.
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ..Self::default()
        }
    }

    pub fn env_filter(&self) -> Result<EnvFilter, CoreError> {
        EnvFilter::try_new(&self.log_level).map_err(|e| {
            CoreError::Validation(format!("Invalid log filter {:?}: {e}", self.log_level))
        })
    }
}

/// Install a global fmt subscriber. Fails if the filter is malformed or a
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), CoreError> {
    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
        .try_init()
        .map_err(|e| CoreError::Validation(format!("Logging already initialised: {e}")))
}
