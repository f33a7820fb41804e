//! Registry query facade.
//!
//! `ArIo` answers registry questions (gateways, ArNS records, epochs,
//! observers, ...) as of an evaluation point. Each call resolves its
//! options once, makes exactly one provider call and projects the answer
//! out of that single snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use ario_state::{
    AbortSignal, ContractStateProvider, DedupStateProvider, EvaluatedState, EvaluationOptions,
    EvaluationPoint, RemoteStateClient, StateResult, TransactionId,
};

use crate::config::ArIoConfig;
use crate::contract_state::{
    ArNSRecord, Auction, EpochDistributions, EpochObservations, Gateway, RegistryState,
    ReservedName, WalletAddress, WeightedObserver,
};
use crate::epoch::{EpochInfo, EpochSchedule};
use crate::obs::{emit_query_failed, emit_query_not_found, emit_query_resolved, QuerySpan};
use crate::telemetry::{Logger, TracingLogger};

/// One decoded snapshot plus the point it was requested at.
struct Snapshot {
    point: EvaluationPoint,
    evaluated: EvaluatedState<RegistryState>,
}

impl Snapshot {
    fn schedule(&self) -> StateResult<EpochSchedule> {
        EpochSchedule::from_distributions(&self.evaluated.state.distributions)
    }

    /// Height the snapshot stands for: the pinned height, else the height
    /// the cache evaluated to, else the contract's last tick.
    fn evaluation_height(&self) -> u64 {
        self.point
            .block_height()
            .or_else(|| self.evaluated.evaluated_height())
            .unwrap_or(self.evaluated.state.last_ticked_height)
    }

    fn current_epoch(&self) -> StateResult<EpochInfo> {
        self.schedule()?.epoch_for_height(self.evaluation_height())
    }
}

/// Read-only client for one registry contract.
#[derive(Clone)]
pub struct ArIo {
    contract_tx_id: TransactionId,
    provider: Arc<dyn ContractStateProvider>,
    logger: Arc<dyn Logger>,
    signal: Option<AbortSignal>,
}

impl std::fmt::Debug for ArIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArIo")
            .field("contract_tx_id", &self.contract_tx_id)
            .field("cancellable", &self.signal.is_some())
            .finish()
    }
}

impl ArIo {
    pub fn new(contract_tx_id: TransactionId, provider: Arc<dyn ContractStateProvider>) -> Self {
        ArIo {
            contract_tx_id,
            provider,
            logger: Arc::new(TracingLogger::default()),
            signal: None,
        }
    }

    /// Facade over the remote cache described by `config`.
    ///
    /// # Errors
    ///
    /// `StateError::Validation` for a malformed contract id,
    /// `StateError::Transport` if the HTTP client cannot be built.
    pub fn from_config(config: &ArIoConfig) -> StateResult<Self> {
        let client = RemoteStateClient::new(config.cache.clone())?;
        let contract_tx_id = client.contract_tx_id().clone();
        let provider: Arc<dyn ContractStateProvider> = if config.deduplicate_requests {
            Arc::new(DedupStateProvider::new(client))
        } else {
            Arc::new(client)
        };
        Ok(Self::new(contract_tx_id, provider))
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// A facade sharing this provider whose calls carry `signal`.
    pub fn with_abort_signal(&self, signal: AbortSignal) -> Self {
        ArIo {
            signal: Some(signal),
            ..self.clone()
        }
    }

    pub fn contract_tx_id(&self) -> &TransactionId {
        &self.contract_tx_id
    }

    async fn snapshot(&self, operation: &str, options: &EvaluationOptions) -> StateResult<Snapshot> {
        let point = options.resolve()?;
        let query = QuerySpan::new(operation, &point);
        let started = Instant::now();
        self.logger.debug(&format!(
            "{operation}: reading {} at {point}",
            self.contract_tx_id.short()
        ));

        let resolved = EvaluationOptions::from(point.clone());
        let result = query
            .instrument(self.provider.get_contract_state(
                &self.contract_tx_id,
                &resolved,
                self.signal.as_ref(),
            ))
            .await
            .and_then(|evaluated| evaluated.decode::<RegistryState>());

        match result {
            Ok(evaluated) => {
                emit_query_resolved(
                    operation,
                    evaluated.sort_key.as_ref(),
                    started.elapsed().as_millis() as u64,
                );
                Ok(Snapshot { point, evaluated })
            }
            Err(err) if err.is_not_found() => {
                emit_query_not_found(operation, &point);
                Err(err)
            }
            Err(err) => {
                emit_query_failed(operation, &err);
                self.logger.warn(&format!("{operation} failed: {err}"));
                Err(err)
            }
        }
    }

    /// Single-entity lookup: an unknown contract or point reads as absent.
    async fn lookup<T>(
        &self,
        operation: &str,
        options: &EvaluationOptions,
        project: impl FnOnce(Snapshot) -> Option<T>,
    ) -> StateResult<Option<T>> {
        match self.snapshot(operation, options).await {
            Ok(snapshot) => Ok(project(snapshot)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// The whole typed registry state.
    pub async fn get_state(&self, options: &EvaluationOptions) -> StateResult<RegistryState> {
        Ok(self.snapshot("get_state", options).await?.evaluated.state)
    }

    /// Balance of `address`; 0 when the wallet holds nothing.
    pub async fn get_balance(&self, address: &str, options: &EvaluationOptions) -> StateResult<u64> {
        let balance = self
            .lookup("get_balance", options, |s| {
                s.evaluated.state.balances.get(address).copied()
            })
            .await?;
        Ok(balance.unwrap_or(0))
    }

    pub async fn get_balances(
        &self,
        options: &EvaluationOptions,
    ) -> StateResult<BTreeMap<WalletAddress, u64>> {
        Ok(self.snapshot("get_balances", options).await?.evaluated.state.balances)
    }

    pub async fn get_gateway(
        &self,
        address: &str,
        options: &EvaluationOptions,
    ) -> StateResult<Option<Gateway>> {
        self.lookup("get_gateway", options, |mut s| {
            s.evaluated.state.gateways.remove(address)
        })
        .await
    }

    pub async fn get_gateways(
        &self,
        options: &EvaluationOptions,
    ) -> StateResult<BTreeMap<WalletAddress, Gateway>> {
        Ok(self.snapshot("get_gateways", options).await?.evaluated.state.gateways)
    }

    pub async fn get_arns_record(
        &self,
        domain: &str,
        options: &EvaluationOptions,
    ) -> StateResult<Option<ArNSRecord>> {
        self.lookup("get_arns_record", options, |mut s| {
            s.evaluated.state.records.remove(domain)
        })
        .await
    }

    pub async fn get_arns_records(
        &self,
        options: &EvaluationOptions,
    ) -> StateResult<BTreeMap<String, ArNSRecord>> {
        Ok(self.snapshot("get_arns_records", options).await?.evaluated.state.records)
    }

    pub async fn get_reserved_names(
        &self,
        options: &EvaluationOptions,
    ) -> StateResult<BTreeMap<String, ReservedName>> {
        Ok(self
            .snapshot("get_reserved_names", options)
            .await?
            .evaluated
            .state
            .reserved)
    }

    pub async fn get_auction(
        &self,
        domain: &str,
        options: &EvaluationOptions,
    ) -> StateResult<Option<Auction>> {
        self.lookup("get_auction", options, |mut s| {
            s.evaluated.state.auctions.remove(domain)
        })
        .await
    }

    pub async fn get_auctions(
        &self,
        options: &EvaluationOptions,
    ) -> StateResult<BTreeMap<String, Auction>> {
        Ok(self.snapshot("get_auctions", options).await?.evaluated.state.auctions)
    }

    /// Epoch containing `block_height`, using the schedule stored in the
    /// snapshot at `options`.
    pub async fn get_epoch(
        &self,
        block_height: u64,
        options: &EvaluationOptions,
    ) -> StateResult<EpochInfo> {
        let snapshot = self.snapshot("get_epoch", options).await?;
        snapshot.schedule()?.epoch_for_height(block_height)
    }

    /// Epoch containing the snapshot's own evaluation height.
    pub async fn get_current_epoch(&self, options: &EvaluationOptions) -> StateResult<EpochInfo> {
        self.snapshot("get_current_epoch", options)
            .await?
            .current_epoch()
    }

    /// Observers prescribed for the current epoch; empty when none were
    /// recorded.
    pub async fn get_prescribed_observers(
        &self,
        options: &EvaluationOptions,
    ) -> StateResult<Vec<WeightedObserver>> {
        let mut snapshot = self.snapshot("get_prescribed_observers", options).await?;
        let epoch = snapshot.current_epoch()?;
        Ok(snapshot
            .evaluated
            .state
            .prescribed_observers
            .remove(&epoch.epoch_start_height)
            .unwrap_or_default())
    }

    /// Observers prescribed for the epoch containing `block_height`.
    pub async fn get_prescribed_observers_for_epoch(
        &self,
        block_height: u64,
        options: &EvaluationOptions,
    ) -> StateResult<Vec<WeightedObserver>> {
        let mut snapshot = self
            .snapshot("get_prescribed_observers_for_epoch", options)
            .await?;
        let epoch = snapshot.schedule()?.epoch_for_height(block_height)?;
        Ok(snapshot
            .evaluated
            .state
            .prescribed_observers
            .remove(&epoch.epoch_start_height)
            .unwrap_or_default())
    }

    /// Observations for every epoch, keyed by epoch start height.
    pub async fn get_observations(
        &self,
        options: &EvaluationOptions,
    ) -> StateResult<BTreeMap<u64, EpochObservations>> {
        Ok(self
            .snapshot("get_observations", options)
            .await?
            .evaluated
            .state
            .observations)
    }

    pub async fn get_epoch_observations(
        &self,
        epoch_start_height: u64,
        options: &EvaluationOptions,
    ) -> StateResult<Option<EpochObservations>> {
        self.lookup("get_epoch_observations", options, |mut s| {
            s.evaluated.state.observations.remove(&epoch_start_height)
        })
        .await
    }

    pub async fn get_distributions(
        &self,
        options: &EvaluationOptions,
    ) -> StateResult<EpochDistributions> {
        Ok(self
            .snapshot("get_distributions", options)
            .await?
            .evaluated
            .state
            .distributions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ario_state::fakes::MemoryStateProvider;
    use ario_state::{SortKey, StateError};
    use serde_json::json;

    const REGISTRY: &str = "bLAgYxAdX2Ry-nt6aH2ixgvJXbpsEYm28NgJgyqfs-U";

    fn registry() -> TransactionId {
        TransactionId::new(REGISTRY).unwrap()
    }

    fn facade_with(state: serde_json::Value) -> (ArIo, Arc<MemoryStateProvider>) {
        let provider = Arc::new(MemoryStateProvider::new());
        provider.record(
            &registry(),
            SortKey::new("000001377000,0000000000000,aaaa").unwrap(),
            state,
        );
        let facade = ArIo::new(registry(), provider.clone());
        (facade, provider)
    }

    fn distributions() -> serde_json::Value {
        json!({
            "epochZeroStartHeight": 1_350_700,
            "epochStartHeight": 1_376_620,
            "epochEndHeight": 1_377_339,
            "epochPeriod": 36,
            "nextDistributionHeight": 1_377_355,
        })
    }

    #[tokio::test]
    async fn test_missing_balance_reads_zero() {
        let (facade, _) = facade_with(json!({
            "balances": {"wallet-a": 42},
            "distributions": distributions(),
        }));
        let latest = EvaluationOptions::latest();
        assert_eq!(facade.get_balance("wallet-a", &latest).await.unwrap(), 42);
        assert_eq!(facade.get_balance("wallet-b", &latest).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_current_epoch_falls_back_to_cache_sort_key() {
        let (facade, _) = facade_with(json!({
            "lastTickedHeight": 1,
            "distributions": distributions(),
        }));
        let epoch = facade
            .get_current_epoch(&EvaluationOptions::latest())
            .await
            .unwrap();
        // sort key height 1_377_000 lies in period 36
        assert_eq!(epoch.epoch_period, 36);
    }

    #[tokio::test]
    async fn test_malformed_state_is_reported() {
        let (facade, _) = facade_with(json!({"gateways": "not-a-map"}));
        let err = facade
            .get_gateways(&EvaluationOptions::latest())
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_with_abort_signal_keeps_provider() {
        let (facade, provider) = facade_with(json!({"distributions": distributions()}));
        let controller = ario_state::AbortController::new();
        let cancellable = facade.with_abort_signal(controller.signal());
        cancellable
            .get_distributions(&EvaluationOptions::latest())
            .await
            .unwrap();
        assert_eq!(provider.calls(), 1);
        assert_eq!(cancellable.contract_tx_id(), facade.contract_tx_id());
    }
}
