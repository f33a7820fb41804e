//! In-memory fakes for the provider and transport traits (testing only)
//!
//! Provides `MemoryStateProvider`, which replays recorded snapshots the way a
//! state cache would, and `StaticHttpClient`, which answers with canned
//! responses and records every request it sees.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ario_types::{EvaluationOptions, EvaluationPoint, SortKey, TransactionId};
use async_trait::async_trait;

use crate::abort::AbortSignal;
use crate::error::{HttpError, StateError};
use crate::http::{check_status, GetRequest, HttpClient, HttpResponse, HttpResult, PostRequest};
use crate::provider::{ContractStateProvider, EvaluatedState, StateResult};

// ---------------------------------------------------------------------------
// MemoryStateProvider
// ---------------------------------------------------------------------------

/// In-memory provider backed by per-contract snapshot histories.
///
/// Each contract maps to the snapshots recorded after given interactions,
/// kept in sort-key order. A block height resolves to the last snapshot whose
/// interaction happened at or before that height; a sort key resolves to the
/// last snapshot at or before that key.
#[derive(Debug, Default)]
pub struct MemoryStateProvider {
    contracts: Mutex<HashMap<String, Vec<(SortKey, serde_json::Value)>>>,
    calls: AtomicUsize,
}

impl MemoryStateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state a contract had after the interaction at `sort_key`.
    pub fn record(&self, contract_tx_id: &TransactionId, sort_key: SortKey, state: serde_json::Value) {
        let mut contracts = self.contracts.lock().unwrap();
        let history = contracts.entry(contract_tx_id.to_string()).or_default();
        let at = history.partition_point(|(key, _)| *key < sort_key);
        if history.get(at).map(|(key, _)| *key == sort_key).unwrap_or(false) {
            history[at].1 = state;
        } else {
            history.insert(at, (sort_key, state));
        }
    }

    /// Number of `get_contract_state` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractStateProvider for MemoryStateProvider {
    async fn get_contract_state(
        &self,
        contract_tx_id: &TransactionId,
        options: &EvaluationOptions,
        signal: Option<&AbortSignal>,
    ) -> StateResult<EvaluatedState> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let point = options.resolve()?;
        if signal.map(AbortSignal::is_aborted).unwrap_or(false) {
            return Err(StateError::Cancelled);
        }

        let not_found = || StateError::NotFound {
            contract_tx_id: contract_tx_id.to_string(),
            evaluation_point: point.to_string(),
        };

        let contracts = self.contracts.lock().unwrap();
        let history = contracts.get(contract_tx_id.as_str()).ok_or_else(not_found)?;
        let entry = match &point {
            EvaluationPoint::Latest => history.last(),
            EvaluationPoint::AtBlockHeight(height) => history
                .iter()
                .rev()
                .find(|(key, _)| key.block_height() <= *height),
            EvaluationPoint::AtSortKey(sort_key) => {
                history.iter().rev().find(|(key, _)| key <= sort_key)
            }
        }
        .ok_or_else(not_found)?;

        Ok(EvaluatedState {
            contract_tx_id: contract_tx_id.clone(),
            sort_key: Some(entry.0.clone()),
            state: entry.1.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// StaticHttpClient
// ---------------------------------------------------------------------------

/// Transport that replays queued responses in order.
#[derive(Debug, Default)]
pub struct StaticHttpClient {
    responses: Mutex<VecDeque<HttpResult<HttpResponse>>>,
    requests: Mutex<Vec<GetRequest>>,
}

impl StaticHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response.
    pub fn respond_json(&self, status: u16, body: &serde_json::Value) {
        self.respond_raw(status, body.to_string().into_bytes());
    }

    /// Queue a raw response body.
    pub fn respond_raw(&self, status: u16, body: Vec<u8>) {
        let mut responses = self.responses.lock().unwrap();
        responses.push_back(Ok(HttpResponse { status, body }));
    }

    /// Queue a transport failure.
    pub fn fail_with(&self, err: HttpError) {
        let mut responses = self.responses.lock().unwrap();
        responses.push_back(Err(err));
    }

    /// Every `get` request received, oldest first.
    pub fn requests(&self) -> Vec<GetRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(
        &self,
        endpoint: &str,
        allowed_statuses: &[u16],
        signal: Option<&AbortSignal>,
    ) -> HttpResult<HttpResponse> {
        if signal.map(AbortSignal::is_aborted).unwrap_or(false) {
            return Err(HttpError::Cancelled {
                endpoint: endpoint.to_string(),
            });
        }
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(HttpError::Request {
                    endpoint: endpoint.to_string(),
                    message: "no canned response queued".to_string(),
                })
            })?;
        check_status(endpoint, response.status, allowed_statuses)?;
        Ok(response)
    }
}

#[async_trait]
impl HttpClient for StaticHttpClient {
    async fn get(&self, request: GetRequest) -> HttpResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_response(
            &request.endpoint,
            &request.allowed_statuses,
            request.signal.as_ref(),
        )
    }

    async fn post(&self, request: PostRequest) -> HttpResult<HttpResponse> {
        self.next_response(
            &request.endpoint,
            &request.allowed_statuses,
            Some(&request.signal),
        )
    }
}
