//! Facade configuration.

use ario_state::RemoteCacheConfig;

use crate::telemetry::LogFormat;

/// Configuration for an [`ArIo`](crate::ArIo) backed by the remote cache.
///
/// `Default` reads the environment:
/// - cache settings as [`RemoteCacheConfig`] (`ARIO_REMOTE_CACHE_URL`,
///   `ARIO_CONTRACT_TX_ID`, `ARIO_REMOTE_CACHE_TIMEOUT_MS`)
/// - `ARIO_DEDUP_REQUESTS` (`false`/`0` disables request sharing)
/// - `ARIO_LOG` (filter, default `info`)
/// - `ARIO_LOG_FORMAT` (`text` or `json`, default `text`)
#[derive(Debug, Clone)]
pub struct ArIoConfig {
    pub cache: RemoteCacheConfig,
    pub deduplicate_requests: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ArIoConfig {
    fn default() -> Self {
        Self {
            cache: RemoteCacheConfig::from_env(),
            deduplicate_requests: std::env::var("ARIO_DEDUP_REQUESTS")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
            log_level: std::env::var("ARIO_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: std::env::var("ARIO_LOG_FORMAT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl ArIoConfig {
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn new(cache: RemoteCacheConfig) -> Self {
        Self {
            cache,
            ..Self::default()
        }
    }

    pub fn with_deduplication(mut self, enabled: bool) -> Self {
        self.deduplicate_requests = enabled;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }
}
