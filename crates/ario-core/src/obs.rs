//! Structured observability hooks for registry queries.
//!
//! Every facade call runs inside a `QuerySpan` tagged with a fresh query id,
//! the operation name and the evaluation point. Outcome events:
//! `query.resolved`, `query.not_found`, `query.failed`.

use std::future::Future;

use ario_state::{EvaluationPoint, SortKey};
use tracing::instrument::Instrumented;
use tracing::{info, Instrument};
use uuid::Uuid;

/// Query-scoped tracing span.
///
/// ```ignore
/// let query = QuerySpan::new("get_gateway", &point);
/// query.instrument(provider.get_contract_state(..)).await
/// ```
#[derive(Debug, Clone)]
pub struct QuerySpan {
    query_id: Uuid,
    span: tracing::Span,
}

impl QuerySpan {
    pub fn new(operation: &str, point: &EvaluationPoint) -> Self {
        let query_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "ario.query",
            query_id = %query_id,
            operation = %operation,
            evaluation_point = %point,
        );
        Self { query_id, span }
    }

    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    /// Run `future` inside this span.
    pub fn instrument<F: Future>(&self, future: F) -> Instrumented<F> {
        future.instrument(self.span.clone())
    }
}

/// Emit event: snapshot fetched and decoded.
pub fn emit_query_resolved(operation: &str, sort_key: Option<&SortKey>, duration_ms: u64) {
    match sort_key {
        Some(key) => info!(
            event = "query.resolved",
            operation = %operation,
            sort_key = %key,
            duration_ms = duration_ms,
        ),
        None => info!(
            event = "query.resolved",
            operation = %operation,
            duration_ms = duration_ms,
        ),
    }
}

/// Emit event: contract or evaluation point unknown to the provider.
pub fn emit_query_not_found(operation: &str, point: &EvaluationPoint) {
    info!(event = "query.not_found", operation = %operation, evaluation_point = %point);
}

/// Emit event: query failed (warning level).
pub fn emit_query_failed(operation: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "query.failed", operation = %operation, error = %error);
}
