//! In-flight request deduplication.
//!
//! `DedupStateProvider` wraps any provider so that concurrent callers asking
//! for the same `(contract, evaluation point)` share one upstream request.
//! Nothing is cached: once the shared request completes its key is released
//! and the next caller starts a fresh one.
//!
//! Each key counts its waiting callers. When the last one leaves (its signal
//! fired or its future was dropped) the entry is removed and the shared
//! request is dropped with it, which tears down the upstream transport call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ario_types::{EvaluationOptions, EvaluationPoint, TransactionId};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::abort::AbortSignal;
use crate::error::StateError;
use crate::provider::{ContractStateProvider, EvaluatedState, StateResult};

type RequestKey = (TransactionId, EvaluationPoint);
type SharedFetch = Shared<BoxFuture<'static, StateResult<EvaluatedState>>>;
type InFlightMap = HashMap<RequestKey, InFlight>;
type Registry = Arc<Mutex<InFlightMap>>;

struct InFlight {
    /// Distinguishes this request from a later one for the same key.
    id: u64,
    waiters: usize,
    fetch: SharedFetch,
}

fn lock(registry: &Mutex<InFlightMap>) -> MutexGuard<'_, InFlightMap> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One caller's claim on an in-flight request. Released on drop.
struct Waiter {
    registry: Registry,
    key: RequestKey,
    id: u64,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        let abandoned = {
            let mut inflight = lock(&self.registry);
            match inflight.get_mut(&self.key) {
                Some(entry) if entry.id == self.id => {
                    entry.waiters -= 1;
                    if entry.waiters == 0 {
                        inflight.remove(&self.key)
                    } else {
                        None
                    }
                }
                _ => None,
            }
        };
        if abandoned.is_some() {
            debug!(contract = %self.key.0.short(), point = %self.key.1, "last waiter left, dropping state request");
        }
        // `abandoned` drops here, outside the lock.
    }
}

/// Coalesces identical concurrent requests onto one upstream call.
pub struct DedupStateProvider<P> {
    inner: Arc<P>,
    inflight: Registry,
    next_id: AtomicU64,
}

impl<P: ContractStateProvider + 'static> DedupStateProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::from_arc(Arc::new(inner))
    }

    pub fn from_arc(inner: Arc<P>) -> Self {
        DedupStateProvider {
            inner,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Number of distinct requests currently in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.inflight).len()
    }

    fn join_or_start(&self, key: RequestKey) -> (SharedFetch, Waiter) {
        let mut inflight = lock(&self.inflight);
        if let Some(existing) = inflight.get_mut(&key) {
            debug!(contract = %key.0.short(), point = %key.1, "joining in-flight state request");
            existing.waiters += 1;
            let waiter = Waiter {
                registry: Arc::clone(&self.inflight),
                key,
                id: existing.id,
            };
            return (existing.fetch.clone(), waiter);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let registry = Arc::clone(&self.inflight);
        let owned_key = key.clone();
        // The shared request carries no caller signal: one caller giving up
        // must not cancel the others.
        let fetch = async move {
            let options = EvaluationOptions::from(owned_key.1.clone());
            let result = inner.get_contract_state(&owned_key.0, &options, None).await;
            let finished = {
                let mut inflight = lock(&registry);
                match inflight.get(&owned_key) {
                    Some(entry) if entry.id == id => inflight.remove(&owned_key),
                    _ => None,
                }
            };
            drop(finished);
            result
        }
        .boxed()
        .shared();

        inflight.insert(
            key.clone(),
            InFlight {
                id,
                waiters: 1,
                fetch: fetch.clone(),
            },
        );
        let waiter = Waiter {
            registry: Arc::clone(&self.inflight),
            key,
            id,
        };
        (fetch, waiter)
    }
}

#[async_trait]
impl<P: ContractStateProvider + 'static> ContractStateProvider for DedupStateProvider<P> {
    async fn get_contract_state(
        &self,
        contract_tx_id: &TransactionId,
        options: &EvaluationOptions,
        signal: Option<&AbortSignal>,
    ) -> StateResult<EvaluatedState> {
        let point = options.resolve()?;
        let (fetch, _waiter) = self.join_or_start((contract_tx_id.clone(), point));

        match signal {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.aborted() => Err(StateError::Cancelled),
                result = fetch => result,
            },
            None => fetch.await,
        }
    }
}
