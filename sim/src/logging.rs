//! Subscriber setup for the driver binaries.
//!
//! Logs go to stderr so CSV output on stdout stays machine-readable.

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Invalid logger format: {0} (expected: text|json)")]
    InvalidFormat(String),
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("Failed to initialize logger: {0}")]
    InitializationFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerFormat {
    Text,
    Json,
}

impl std::str::FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LoggerFormat::Text),
            "json" => Ok(LoggerFormat::Json),
            other => Err(LoggerError::InvalidFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Used when `RUST_LOG` is unset.
    pub level: String,
    pub with_targets: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: false,
        }
    }
}

impl LoggerConfig {
    /// Defaults, overridden by `STEAL_LOG_FORMAT` when set.
    pub fn from_env() -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Ok(format) = std::env::var("STEAL_LOG_FORMAT") {
            cfg.format = format.parse()?;
        }
        Ok(cfg)
    }
}

pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = mk_filter(&cfg.level)?;
    let registry = tracing_subscriber::registry().with(filter);
    let result = match cfg.format {
        LoggerFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(cfg.with_targets),
            )
            .try_init(),
        LoggerFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(cfg.with_targets),
            )
            .try_init(),
    };
    result.map_err(|e| LoggerError::InitializationFailed(e.to_string()))
}

fn mk_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLogLevel(level.to_string())),
    }
}
