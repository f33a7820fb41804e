//! ario-state: Contract State Providers for the ar.io Registry Client
//!
//! This crate resolves registry contract state as of an evaluation point.
//! It owns all I/O with the state cache service and hands typed snapshots to
//! the query facade in `ario-core`.
//!
//! ## Key Components
//!
//! - `ContractStateProvider`: the provider seam (latest / block height / sort key)
//! - `RemoteStateClient`: provider backed by a remote state cache
//! - `DedupStateProvider`: at most one in-flight request per identical key
//! - `HttpClient` / `ReqwestHttpClient`: transport collaborator
//! - `AbortController` / `AbortSignal`: cooperative cancellation
//!
//! In-memory fakes for both traits live in the `fakes` module.

pub mod abort;
pub mod dedup;
mod error;
pub mod fakes;
pub mod http;
pub mod provider;
pub mod remote;

pub use abort::{AbortController, AbortSignal};
pub use dedup::DedupStateProvider;
pub use error::{HttpError, StateError};
pub use http::{GetRequest, HttpClient, HttpResponse, HttpResult, PostRequest, ReqwestHttpClient};
pub use provider::{ContractStateProvider, EvaluatedState, StateResult};
pub use remote::{
    CacheEnvelope, RemoteCacheConfig, RemoteStateClient, ARNS_DEVNET_REGISTRY_TX,
    ARNS_TESTNET_REGISTRY_TX, DEFAULT_REMOTE_CACHE_URL,
};

pub use ario_types::{EvalTo, EvaluationOptions, EvaluationPoint, SortKey, TransactionId, ValidationError};
