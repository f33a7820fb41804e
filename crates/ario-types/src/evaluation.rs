//! Evaluation options and the resolved evaluation point.
//!
//! `EvaluationOptions` mirrors what callers (and the cache service) send:
//! an optional `evalTo` carrying a block height or a sort key. It is resolved
//! exactly once per query into an [`EvaluationPoint`], which cannot hold both.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::sort_key::SortKey;

/// Where to pin an evaluation, as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalTo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
}

/// Per-call evaluation options. Unset `eval_to` means "latest".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_to: Option<EvalTo>,
}

impl EvaluationOptions {
    /// Evaluate to the latest known state.
    pub fn latest() -> Self {
        Self::default()
    }

    /// Pin evaluation to a block height.
    pub fn at_block_height(block_height: u64) -> Self {
        EvaluationOptions {
            eval_to: Some(EvalTo {
                block_height: Some(block_height),
                sort_key: None,
            }),
        }
    }

    /// Pin evaluation to a sort key.
    pub fn at_sort_key(sort_key: &SortKey) -> Self {
        EvaluationOptions {
            eval_to: Some(EvalTo {
                block_height: None,
                sort_key: Some(sort_key.to_string()),
            }),
        }
    }

    /// Resolve into a single evaluation point.
    ///
    /// # Errors
    ///
    /// - `ValidationError::ConflictingEvaluationOptions` when both a block
    ///   height and a sort key are set.
    /// - `ValidationError::InvalidSortKey` when the sort key is malformed.
    pub fn resolve(&self) -> Result<EvaluationPoint> {
        let Some(eval_to) = &self.eval_to else {
            return Ok(EvaluationPoint::Latest);
        };
        match (eval_to.block_height, eval_to.sort_key.as_deref()) {
            (Some(_), Some(_)) => Err(ValidationError::ConflictingEvaluationOptions),
            (Some(height), None) => Ok(EvaluationPoint::AtBlockHeight(height)),
            (None, Some(key)) => Ok(EvaluationPoint::AtSortKey(SortKey::new(key)?)),
            (None, None) => Ok(EvaluationPoint::Latest),
        }
    }
}

/// A resolved evaluation point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum EvaluationPoint {
    #[default]
    Latest,
    AtBlockHeight(u64),
    AtSortKey(SortKey),
}

impl EvaluationPoint {
    /// Request parameters for this point; empty for `Latest`.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            EvaluationPoint::Latest => Vec::new(),
            EvaluationPoint::AtBlockHeight(height) => vec![("blockHeight", height.to_string())],
            EvaluationPoint::AtSortKey(key) => vec![("sortKey", key.to_string())],
        }
    }

    /// Block height the point pins to, if it pins to one.
    pub fn block_height(&self) -> Option<u64> {
        match self {
            EvaluationPoint::Latest => None,
            EvaluationPoint::AtBlockHeight(height) => Some(*height),
            EvaluationPoint::AtSortKey(key) => Some(key.block_height()),
        }
    }
}

impl From<EvaluationPoint> for EvaluationOptions {
    fn from(point: EvaluationPoint) -> Self {
        match point {
            EvaluationPoint::Latest => EvaluationOptions::latest(),
            EvaluationPoint::AtBlockHeight(height) => EvaluationOptions::at_block_height(height),
            EvaluationPoint::AtSortKey(key) => EvaluationOptions::at_sort_key(&key),
        }
    }
}

impl fmt::Display for EvaluationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationPoint::Latest => write!(f, "latest"),
            EvaluationPoint::AtBlockHeight(height) => write!(f, "blockHeight={height}"),
            EvaluationPoint::AtSortKey(key) => write!(f, "sortKey={key}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "000001376946,0000000000000,18d52956c8e13ae1f557b4e67f6f298b";

    #[test]
    fn test_unset_resolves_to_latest() {
        assert_eq!(
            EvaluationOptions::latest().resolve().unwrap(),
            EvaluationPoint::Latest
        );
        let empty = EvaluationOptions {
            eval_to: Some(EvalTo::default()),
        };
        assert_eq!(empty.resolve().unwrap(), EvaluationPoint::Latest);
    }

    #[test]
    fn test_block_height_resolves() {
        let point = EvaluationOptions::at_block_height(1_377_100)
            .resolve()
            .unwrap();
        assert_eq!(point, EvaluationPoint::AtBlockHeight(1_377_100));
        assert_eq!(point.query_params(), vec![("blockHeight", "1377100".to_string())]);
    }

    #[test]
    fn test_sort_key_resolves() {
        let key = SortKey::new(KEY).unwrap();
        let point = EvaluationOptions::at_sort_key(&key).resolve().unwrap();
        assert_eq!(point.block_height(), Some(1_376_946));
        assert_eq!(point.query_params(), vec![("sortKey", KEY.to_string())]);
    }

    #[test]
    fn test_both_set_is_rejected() {
        let options = EvaluationOptions {
            eval_to: Some(EvalTo {
                block_height: Some(1),
                sort_key: Some(KEY.to_string()),
            }),
        };
        assert_eq!(
            options.resolve().unwrap_err(),
            ValidationError::ConflictingEvaluationOptions
        );
    }

    #[test]
    fn test_malformed_sort_key_is_rejected() {
        let options = EvaluationOptions {
            eval_to: Some(EvalTo {
                block_height: None,
                sort_key: Some("garbage".to_string()),
            }),
        };
        assert!(matches!(
            options.resolve(),
            Err(ValidationError::InvalidSortKey { .. })
        ));
    }

    #[test]
    fn test_camel_case_wire_shape() {
        let options: EvaluationOptions =
            serde_json::from_str(r#"{"evalTo":{"blockHeight":42}}"#).unwrap();
        assert_eq!(options, EvaluationOptions::at_block_height(42));
        assert_eq!(
            serde_json::to_string(&options).unwrap(),
            r#"{"evalTo":{"blockHeight":42}}"#
        );
    }

    #[test]
    fn test_point_converts_back_into_options() {
        let key = SortKey::new(KEY).unwrap();
        let point = EvaluationPoint::AtSortKey(key);
        let options = EvaluationOptions::from(point.clone());
        assert_eq!(options.resolve().unwrap(), point);
        assert_eq!(point.to_string(), format!("sortKey={KEY}"));
    }
}
