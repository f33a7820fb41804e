//! Epoch window arithmetic.
//!
//! The registry divides block heights into fixed-length epochs counted from
//! `epochZeroStartHeight`. Heights before epoch zero fall into epoch zero.

use ario_state::{StateError, StateResult, ValidationError};
use serde::{Deserialize, Serialize};

use crate::contract_state::EpochDistributions;

/// Blocks per epoch when the contract does not carry its own value.
pub const EPOCH_BLOCK_LENGTH: u64 = 720;

/// Blocks between an epoch's end and its reward distribution.
pub const EPOCH_DISTRIBUTION_DELAY: u64 = 15;

/// Epoch window containing a given block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochInfo {
    pub epoch_start_height: u64,
    pub epoch_block_length: u64,
    pub epoch_distribution_height: u64,
    pub epoch_end_height: u64,
    pub epoch_period: u64,
    pub epoch_zero_start_height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochSchedule {
    pub epoch_zero_start_height: u64,
    pub epoch_block_length: u64,
    pub distribution_delay: u64,
}

impl EpochSchedule {
    /// # Errors
    ///
    /// `StateError::Malformed` for a zero-length epoch.
    pub fn new(epoch_zero_start_height: u64, epoch_block_length: u64) -> StateResult<Self> {
        if epoch_block_length == 0 {
            return Err(StateError::Malformed(
                "epochBlockLength must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            epoch_zero_start_height,
            epoch_block_length,
            distribution_delay: EPOCH_DISTRIBUTION_DELAY,
        })
    }

    pub fn from_distributions(distributions: &EpochDistributions) -> StateResult<Self> {
        Self::new(
            distributions.epoch_zero_start_height,
            distributions
                .epoch_block_length
                .unwrap_or(EPOCH_BLOCK_LENGTH),
        )
    }

    /// # Errors
    ///
    /// `ValidationError::BlockHeightOutOfRange` when the epoch window or its
    /// distribution height would not fit in a `u64`.
    pub fn epoch_for_height(&self, block_height: u64) -> StateResult<EpochInfo> {
        let out_of_range = || ValidationError::BlockHeightOutOfRange { block_height };
        let elapsed = block_height.saturating_sub(self.epoch_zero_start_height);
        let epoch_period = elapsed / self.epoch_block_length;
        // period * length <= elapsed, so the start never overflows.
        let epoch_start_height = self.epoch_zero_start_height + epoch_period * self.epoch_block_length;
        let epoch_end_height = epoch_start_height
            .checked_add(self.epoch_block_length)
            .ok_or_else(out_of_range)?;
        let epoch_distribution_height = epoch_end_height
            .checked_add(self.distribution_delay)
            .ok_or_else(out_of_range)?;
        Ok(EpochInfo {
            epoch_start_height,
            epoch_block_length: self.epoch_block_length,
            epoch_distribution_height,
            epoch_end_height,
            epoch_period,
            epoch_zero_start_height: self.epoch_zero_start_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> EpochSchedule {
        EpochSchedule::new(1_350_700, 720).unwrap()
    }

    #[test]
    fn test_first_block_of_epoch_zero() {
        let epoch = schedule().epoch_for_height(1_350_700).unwrap();
        assert_eq!(epoch.epoch_period, 0);
        assert_eq!(epoch.epoch_start_height, 1_350_700);
        assert_eq!(epoch.epoch_end_height, 1_351_420);
        assert_eq!(epoch.epoch_distribution_height, 1_351_435);
    }

    #[test]
    fn test_boundary_starts_next_epoch() {
        let epoch = schedule().epoch_for_height(1_351_420).unwrap();
        assert_eq!(epoch.epoch_period, 1);
        assert_eq!(epoch.epoch_start_height, 1_351_420);
    }

    #[test]
    fn test_height_inside_later_epoch() {
        let epoch = schedule().epoch_for_height(1_377_100).unwrap();
        // (1_377_100 - 1_350_700) / 720 = 36
        assert_eq!(epoch.epoch_period, 36);
        assert_eq!(epoch.epoch_start_height, 1_350_700 + 36 * 720);
        assert!(epoch.epoch_start_height <= 1_377_100);
        assert!(1_377_100 < epoch.epoch_end_height);
    }

    #[test]
    fn test_heights_before_epoch_zero_clamp() {
        let epoch = schedule().epoch_for_height(10).unwrap();
        assert_eq!(epoch.epoch_period, 0);
        assert_eq!(epoch.epoch_start_height, 1_350_700);
    }

    #[test]
    fn test_height_near_u64_max_is_rejected() {
        let err = schedule().epoch_for_height(u64::MAX).unwrap_err();
        assert_eq!(
            err,
            StateError::Validation(ValidationError::BlockHeightOutOfRange {
                block_height: u64::MAX
            })
        );
    }

    #[test]
    fn test_last_epoch_that_fits_is_computed() {
        let schedule = EpochSchedule::new(0, 720).unwrap();
        let height = u64::MAX - 720 - EPOCH_DISTRIBUTION_DELAY - 720;
        let epoch = schedule.epoch_for_height(height).unwrap();
        assert!(epoch.epoch_start_height <= height);
        assert!(height < epoch.epoch_end_height);
    }

    #[test]
    fn test_zero_length_is_malformed() {
        assert!(matches!(
            EpochSchedule::new(0, 0),
            Err(StateError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_length_uses_default() {
        let schedule = EpochSchedule::from_distributions(&EpochDistributions {
            epoch_zero_start_height: 100,
            ..EpochDistributions::default()
        })
        .unwrap();
        assert_eq!(schedule.epoch_block_length, EPOCH_BLOCK_LENGTH);
        assert_eq!(schedule.distribution_delay, EPOCH_DISTRIBUTION_DELAY);
    }

    #[test]
    fn test_epoch_info_wire_names() {
        let value = serde_json::to_value(schedule().epoch_for_height(1_350_700).unwrap()).unwrap();
        for field in [
            "epochStartHeight",
            "epochBlockLength",
            "epochDistributionHeight",
            "epochEndHeight",
            "epochPeriod",
            "epochZeroStartHeight",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }
}
