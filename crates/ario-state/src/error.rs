//! Error types for ario-state

use ario_types::ValidationError;
use thiserror::Error;

/// Errors raised by an [`HttpClient`](crate::http::HttpClient).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Non-2xx status that was not in the request's allowed list
    #[error("HTTP {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    /// Connection, TLS or protocol failure
    #[error("request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    /// Request did not complete within the configured timeout
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// Caller aborted the request through its abort signal
    #[error("request to {endpoint} was cancelled")]
    Cancelled { endpoint: String },

    /// Response body could not be read or decoded
    #[error("invalid response body from {endpoint}: {message}")]
    Body { endpoint: String, message: String },
}

impl HttpError {
    /// Map a reqwest failure for `endpoint`, keeping timeouts distinct.
    pub fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else if err.is_decode() || err.is_body() {
            HttpError::Body {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            HttpError::Request {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Errors that can occur while resolving contract state.
///
/// `Clone` so that one in-flight result can be handed to every caller that
/// joined it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// Malformed identifier, sort key or conflicting evaluation options
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The cache has no state for this contract or evaluation point
    #[error("no state for contract {contract_tx_id} at {evaluation_point}")]
    NotFound {
        contract_tx_id: String,
        evaluation_point: String,
    },

    /// Network, status or protocol failure while asking the cache
    #[error("transport failure: {0}")]
    Transport(HttpError),

    /// The caller's abort signal fired
    #[error("state request cancelled")]
    Cancelled,

    /// The cache answered, but not with the declared state shape
    #[error("malformed contract state: {0}")]
    Malformed(String),
}

impl StateError {
    /// Whether this is the "nothing there" outcome rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StateError::NotFound { .. })
    }
}

impl From<HttpError> for StateError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Cancelled { .. } => StateError::Cancelled,
            other => StateError::Transport(other),
        }
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_not_transport() {
        let err: StateError = HttpError::Cancelled {
            endpoint: "/v1/contract/x".to_string(),
        }
        .into();
        assert_eq!(err, StateError::Cancelled);
    }

    #[test]
    fn test_timeout_stays_transport() {
        let err: StateError = HttpError::Timeout {
            endpoint: "/v1/contract/x".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            StateError::Transport(HttpError::Timeout { .. })
        ));
    }

    #[test]
    fn test_validation_wraps() {
        let err: StateError = ValidationError::ConflictingEvaluationOptions.into();
        assert!(err.to_string().contains("validation failed"));
        assert!(!err.is_not_found());
    }
}
