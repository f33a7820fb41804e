//! Remote state cache client
//!
//! Reads evaluated contract state from an ar.io state cache service
//! (`GET /v1/contract/{contractTxId}`), optionally pinned with a
//! `blockHeight` or `sortKey` query parameter.

use std::sync::Arc;
use std::time::Duration;

use ario_types::{EvaluationOptions, EvaluationPoint, SortKey, TransactionId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::abort::AbortSignal;
use crate::error::StateError;
use crate::http::{GetRequest, HttpClient, ReqwestHttpClient};
use crate::provider::{ContractStateProvider, EvaluatedState, StateResult};

/// Public ar.io state cache.
pub const DEFAULT_REMOTE_CACHE_URL: &str = "https://api.arns.app";
/// ArNS registry contract on testnet.
pub const ARNS_TESTNET_REGISTRY_TX: &str = "bLAgYxAdX2Ry-nt6aH2ixgvJXbpsEYm28NgJgyqfs-U";
/// ArNS registry contract on devnet.
pub const ARNS_DEVNET_REGISTRY_TX: &str = "_NctcA2sRy1-J4OmIQZbYFPM17piNcbdBPH2ncX2RL8";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Remote cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCacheConfig {
    /// Cache service base URL
    pub url: String,
    /// Registry contract to read
    pub contract_tx_id: String,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for RemoteCacheConfig {
    fn default() -> Self {
        RemoteCacheConfig {
            url: std::env::var("ARIO_REMOTE_CACHE_URL")
                .unwrap_or_else(|_| DEFAULT_REMOTE_CACHE_URL.to_string()),
            contract_tx_id: std::env::var("ARIO_CONTRACT_TX_ID")
                .unwrap_or_else(|_| ARNS_TESTNET_REGISTRY_TX.to_string()),
            timeout_ms: std::env::var("ARIO_REMOTE_CACHE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl RemoteCacheConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific cache service
    pub fn new(url: &str) -> Self {
        RemoteCacheConfig {
            url: url.to_string(),
            contract_tx_id: ARNS_TESTNET_REGISTRY_TX.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Read a different registry contract
    pub fn with_contract(mut self, contract_tx_id: &str) -> Self {
        self.contract_tx_id = contract_tx_id.to_string();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// State provider backed by a remote state cache.
///
/// Issues exactly one `GET` per call and performs no retries; retry policy
/// belongs to the transport.
#[derive(Clone)]
pub struct RemoteStateClient {
    contract_tx_id: TransactionId,
    http: Arc<dyn HttpClient>,
}

impl RemoteStateClient {
    /// Build a client with a reqwest transport.
    ///
    /// # Errors
    ///
    /// `StateError::Validation` for a malformed contract id,
    /// `StateError::Transport` if the HTTP client cannot be built.
    pub fn new(config: RemoteCacheConfig) -> StateResult<Self> {
        let http = ReqwestHttpClient::new(&config.url, config.timeout())?;
        Self::with_http_client(&config.contract_tx_id, Arc::new(http))
    }

    /// Build a client over any transport.
    pub fn with_http_client(contract_tx_id: &str, http: Arc<dyn HttpClient>) -> StateResult<Self> {
        Ok(RemoteStateClient {
            contract_tx_id: TransactionId::new(contract_tx_id)?,
            http,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> StateResult<Self> {
        Self::new(RemoteCacheConfig::from_env())
    }

    /// The configured registry contract.
    pub fn contract_tx_id(&self) -> &TransactionId {
        &self.contract_tx_id
    }

    /// Typed state of the configured contract.
    pub async fn get_state<T: DeserializeOwned>(&self, options: &EvaluationOptions) -> StateResult<T> {
        let evaluated = self
            .get_contract_state(&self.contract_tx_id, options, None)
            .await?;
        Ok(evaluated.decode::<T>()?.state)
    }
}

#[async_trait]
impl ContractStateProvider for RemoteStateClient {
    async fn get_contract_state(
        &self,
        contract_tx_id: &TransactionId,
        options: &EvaluationOptions,
        signal: Option<&AbortSignal>,
    ) -> StateResult<EvaluatedState> {
        // Conflicting options never reach the network.
        let point = options.resolve()?;

        let endpoint = format!("/v1/contract/{contract_tx_id}");
        let mut request = GetRequest::new(&endpoint)
            .with_header("accept", "application/json")
            .allow_status(404)
            .with_signal(signal.cloned());
        for (key, value) in point.query_params() {
            request = request.with_query(key, value);
        }

        debug!(contract = %contract_tx_id.short(), point = %point, "fetching contract state");

        let response = self.http.get(request).await.map_err(|err| {
            warn!(contract = %contract_tx_id.short(), point = %point, error = %err, "state request failed");
            StateError::from(err)
        })?;

        if response.status == 404 {
            return Err(StateError::NotFound {
                contract_tx_id: contract_tx_id.to_string(),
                evaluation_point: point.to_string(),
            });
        }

        let envelope: CacheEnvelope = response
            .json()
            .map_err(|err| StateError::Malformed(format!("{endpoint}: {err}")))?;
        envelope
            .check_answers(contract_tx_id, &point)
            .map_err(|reason| StateError::Malformed(format!("{endpoint}: {reason}")))?;

        Ok(envelope.into())
    }
}

/// Body of `GET /v1/contract/{contractTxId}`.
///
/// `evaluationOptions` echoes the point the cache evaluated to; an empty or
/// missing echo makes no claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope {
    pub contract_tx_id: TransactionId,
    pub state: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_options: Option<EvaluationOptions>,
}

impl CacheEnvelope {
    /// Whether this envelope answers `contract_tx_id` at `requested`.
    ///
    /// A pinned request must be echoed with the same pin (or none at all).
    pub fn check_answers(
        &self,
        contract_tx_id: &TransactionId,
        requested: &EvaluationPoint,
    ) -> Result<(), String> {
        if self.contract_tx_id != *contract_tx_id {
            return Err(format!("cache answered for contract {}", self.contract_tx_id));
        }
        let Some(options) = &self.evaluation_options else {
            return Ok(());
        };
        let echoed = options
            .resolve()
            .map_err(|err| format!("evaluationOptions: {err}"))?;
        match (&echoed, requested) {
            (EvaluationPoint::Latest, _) | (_, EvaluationPoint::Latest) => Ok(()),
            (echoed, requested) if echoed == requested => Ok(()),
            (echoed, requested) => Err(format!(
                "cache answered at {echoed}, requested {requested}"
            )),
        }
    }
}

impl From<CacheEnvelope> for EvaluatedState {
    fn from(envelope: CacheEnvelope) -> Self {
        EvaluatedState {
            contract_tx_id: envelope.contract_tx_id,
            sort_key: envelope.sort_key,
            state: envelope.state,
        }
    }
}
