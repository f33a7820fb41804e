//! Property tests for identifier construction and sort-key ordering.

use ario_types::{EvalTo, EvaluationOptions, SortKey, TransactionId, ValidationError};
use proptest::prelude::*;

fn sort_key(height: u64, ordinal: u64, hash: &str) -> SortKey {
    SortKey::new(format!("{height:012},{ordinal:013},{hash}")).unwrap()
}

proptest! {
    #[test]
    fn valid_ids_round_trip(raw in "[a-zA-Z0-9_-]{43}") {
        let id = TransactionId::new(raw.clone()).unwrap();
        prop_assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn wrong_length_ids_are_rejected(raw in "[a-zA-Z0-9_-]{0,42}|[a-zA-Z0-9_-]{44,64}") {
        let is_invalid_id = matches!(
            TransactionId::new(raw),
            Err(ValidationError::InvalidTransactionId { .. })
        );
        prop_assert!(is_invalid_id);
    }

    #[test]
    fn disallowed_characters_are_rejected(
        prefix in "[a-zA-Z0-9_-]{21}",
        bad in "[^a-zA-Z0-9_-]",
        suffix in "[a-zA-Z0-9_-]{21}",
    ) {
        let raw = format!("{prefix}{bad}{suffix}");
        prop_assert!(TransactionId::new(raw).is_err());
    }

    #[test]
    fn earlier_blocks_sort_first(
        h1 in 0u64..999_999_999_999,
        gap in 1u64..1_000_000,
        o1 in 0u64..9_999_999_999_999,
        o2 in 0u64..9_999_999_999_999,
        hash1 in "[a-f0-9]{1,64}",
        hash2 in "[a-f0-9]{1,64}",
    ) {
        let h2 = (h1 + gap).min(999_999_999_999);
        prop_assume!(h1 < h2);
        let a = sort_key(h1, o1, &hash1);
        let b = sort_key(h2, o2, &hash2);
        prop_assert!(a < b);
        prop_assert!(a.as_str() < b.as_str());
    }

    #[test]
    fn conflicting_options_never_resolve(height in any::<u64>(), h in 0u64..999_999_999_999) {
        let options = EvaluationOptions {
            eval_to: Some(EvalTo {
                block_height: Some(height),
                sort_key: Some(sort_key(h, 0, "abc").to_string()),
            }),
        };
        prop_assert_eq!(
            options.resolve().unwrap_err(),
            ValidationError::ConflictingEvaluationOptions
        );
    }
}

#[test]
fn sort_key_height_matches_encoding() {
    let key = sort_key(1_377_100, 7, "deadbeef");
    assert_eq!(key.block_height(), 1_377_100);
}
