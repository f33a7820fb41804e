//! Validation error taxonomy for identifier and evaluation-point types.

/// Errors raised while constructing validated values.
///
/// These are always local: they are produced before any I/O happens and are
/// never worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(
        "invalid transaction id {value:?}: expected a 43-character alphanumeric string \
         potentially including \"-\" and \"_\""
    )]
    InvalidTransactionId { value: String },

    #[error("invalid sort key {value:?}: {reason}")]
    InvalidSortKey { value: String, reason: String },

    #[error("evaluation options may set blockHeight or sortKey, not both")]
    ConflictingEvaluationOptions,

    #[error("transaction id {value} cannot be interpreted as a number")]
    NumericInterpretation { value: String },

    #[error("block height {block_height} lies past the last representable epoch")]
    BlockHeightOutOfRange { block_height: u64 },
}

/// Result type for validated constructors.
pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transaction_id_display() {
        let err = ValidationError::InvalidTransactionId {
            value: "short".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("short"));
        assert!(msg.contains("43-character"));
    }

    #[test]
    fn test_invalid_sort_key_carries_reason() {
        let err = ValidationError::InvalidSortKey {
            value: "1,2".to_string(),
            reason: "expected 3 segments".to_string(),
        };
        assert!(err.to_string().contains("expected 3 segments"));
    }

    #[test]
    fn test_conflicting_options_display() {
        let err = ValidationError::ConflictingEvaluationOptions;
        assert!(err.to_string().contains("not both"));
    }
}
