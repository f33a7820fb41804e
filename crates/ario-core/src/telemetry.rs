//! Tracing initialisation and the `Logger` collaborator.
//!
//! Call [`init_tracing`] once at program start. It installs the global
//! subscriber and returns a [`TracingLogger`] whose level and output format
//! can be changed afterwards through the [`Logger`] trait.
//!
//! Calling it again is harmless: the global subscriber can only be set once
//! per process, so later calls return a logger whose reconfiguration has no
//! effect on output.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter, fmt as tfmt, reload, EnvFilter, Layer, Registry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    #[error("invalid log level '{level}': {message}")]
    InvalidLogLevel { level: String, message: String },

    #[error("invalid log format '{0}' (expected 'text' or 'json')")]
    InvalidLogFormat(String),

    #[error("failed to reload log filter: {0}")]
    Reload(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(TelemetryError::InvalidLogFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Logging collaborator handed to the query facade.
pub trait Logger: Send + Sync {
    /// Replace the active filter (`"debug"`, `"ario_state=trace,info"`, ...).
    fn set_log_level(&self, level: &str) -> Result<(), TelemetryError>;
    fn set_log_format(&self, format: LogFormat);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn debug(&self, message: &str);
}

/// `Logger` over the global `tracing` subscriber.
///
/// A default-constructed logger only forwards messages; it has no handle on
/// the subscriber, so level and format changes are accepted and ignored.
#[derive(Clone, Default)]
pub struct TracingLogger {
    filter: Option<reload::Handle<EnvFilter, Registry>>,
    json: Arc<AtomicBool>,
}

impl fmt::Debug for TracingLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingLogger")
            .field("reloadable", &self.filter.is_some())
            .field("format", &self.format())
            .finish()
    }
}

impl TracingLogger {
    pub fn format(&self) -> LogFormat {
        if self.json.load(Ordering::Relaxed) {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

impl Logger for TracingLogger {
    fn set_log_level(&self, level: &str) -> Result<(), TelemetryError> {
        let new_filter = EnvFilter::try_new(level).map_err(|e| TelemetryError::InvalidLogLevel {
            level: level.to_string(),
            message: e.to_string(),
        })?;
        if let Some(handle) = &self.filter {
            handle
                .reload(new_filter)
                .map_err(|e| TelemetryError::Reload(e.to_string()))?;
        }
        Ok(())
    }

    fn set_log_format(&self, format: LogFormat) {
        self.json.store(format == LogFormat::Json, Ordering::Relaxed);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "ario", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "ario", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "ario", "{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "ario", "{message}");
    }
}

/// Initialise the global tracing subscriber.
///
/// Respects `RUST_LOG`; falls back to `level` when it is unset or invalid.
/// Both a text and a JSON layer are installed and exactly one of them
/// writes, selected by `format` and switchable later via
/// [`Logger::set_log_format`].
pub fn init_tracing(format: LogFormat, level: Level) -> TracingLogger {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let (filter_layer, handle) = reload::Layer::new(env_filter);

    let json = Arc::new(AtomicBool::new(format == LogFormat::Json));
    let json_enabled = Arc::clone(&json);
    let text_enabled = Arc::clone(&json);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            tfmt::layer()
                .with_target(false)
                .with_filter(filter::filter_fn(move |_| !text_enabled.load(Ordering::Relaxed))),
        )
        .with(
            tfmt::layer()
                .with_target(false)
                .json()
                .with_filter(filter::filter_fn(move |_| json_enabled.load(Ordering::Relaxed))),
        )
        .try_init()
        .ok();

    TracingLogger {
        filter: Some(handle),
        json,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_does_not_panic() {
        let first = init_tracing(LogFormat::Text, Level::INFO);
        let second = init_tracing(LogFormat::Json, Level::DEBUG);
        assert_eq!(first.format(), LogFormat::Text);
        assert_eq!(second.format(), LogFormat::Json);
    }

    #[test]
    fn test_set_log_format_switches_layer() {
        let logger = init_tracing(LogFormat::Text, Level::INFO);
        logger.set_log_format(LogFormat::Json);
        assert_eq!(logger.format(), LogFormat::Json);
        logger.info("now in json");
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let logger = TracingLogger::default();
        let err = logger.set_log_level("ario_state=loud").unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidLogLevel { .. }));
        assert!(logger.set_log_level("debug").is_ok());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
