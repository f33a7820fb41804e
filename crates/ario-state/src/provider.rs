//! State provider abstraction.
//!
//! `ContractStateProvider` is the single seam across which latest and
//! historical evaluation semantics flow. A remote cache, a local replay
//! engine or a test double can stand behind it without the query facade
//! noticing.

use std::sync::Arc;

use ario_types::{EvaluationOptions, SortKey, TransactionId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::abort::AbortSignal;
use crate::error::StateError;

/// Result type for state operations
pub type StateResult<T> = std::result::Result<T, StateError>;

/// Contract state as of one evaluation point.
///
/// Providers return the raw JSON state; [`decode`](EvaluatedState::decode)
/// turns it into the caller's declared shape. `sort_key` is the interaction
/// the provider evaluated up to, when it reports one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedState<T = serde_json::Value> {
    pub contract_tx_id: TransactionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<SortKey>,
    pub state: T,
}

impl EvaluatedState<serde_json::Value> {
    /// Validate the raw state against `T`.
    ///
    /// # Errors
    ///
    /// `StateError::Malformed` when the JSON does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> StateResult<EvaluatedState<T>> {
        let state = serde_json::from_value(self.state)?;
        Ok(EvaluatedState {
            contract_tx_id: self.contract_tx_id,
            sort_key: self.sort_key,
            state,
        })
    }
}

impl<T> EvaluatedState<T> {
    /// Block height of the interaction this state was evaluated to.
    pub fn evaluated_height(&self) -> Option<u64> {
        self.sort_key.as_ref().map(SortKey::block_height)
    }
}

/// Fetches contract state as of an evaluation point.
///
/// Guarantees:
/// - Conflicting `options` fail with `StateError::Validation` before any I/O.
/// - Missing contract or evaluation point is `StateError::NotFound`, never a
///   transport failure.
/// - One call yields exactly one snapshot; nothing is blended across points.
/// - A fired `signal` ends the call with `StateError::Cancelled`.
#[async_trait]
pub trait ContractStateProvider: Send + Sync {
    async fn get_contract_state(
        &self,
        contract_tx_id: &TransactionId,
        options: &EvaluationOptions,
        signal: Option<&AbortSignal>,
    ) -> StateResult<EvaluatedState>;
}

#[async_trait]
impl<P: ContractStateProvider + ?Sized> ContractStateProvider for Arc<P> {
    async fn get_contract_state(
        &self,
        contract_tx_id: &TransactionId,
        options: &EvaluationOptions,
        signal: Option<&AbortSignal>,
    ) -> StateResult<EvaluatedState> {
        (**self)
            .get_contract_state(contract_tx_id, options, signal)
            .await
    }
}
