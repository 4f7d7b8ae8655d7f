//! # EPoS Auction Eligibility
//!
//! Decides whether a validator may bid for slots in the next epoch.

use crate::domain::{Dec, ValidatorRecord, ValidatorSnapshot, ValidatorStatus};

/// Signing availability over the epoch since a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputedSigning {
    /// Blocks signed since the snapshot.
    pub signed: u64,
    /// Blocks to sign since the snapshot.
    pub to_sign: u64,
    /// `signed / to_sign`; zero when nothing was due.
    pub percentage: Dec,
    /// Whether availability is at or below the 2/3 threshold.
    pub is_below_threshold: bool,
}

/// Compare the validator's running counters against its snapshot.
///
/// A validator with nothing to sign is not below threshold. Counters that
/// went backwards are treated as below threshold.
pub fn compute_current_signing(
    snapshot: &ValidatorSnapshot,
    validator: &ValidatorRecord,
) -> ComputedSigning {
    let now = validator.counters;
    let then = snapshot.counters;
    let (Some(signed), Some(to_sign)) = (
        now.num_blocks_signed.checked_sub(then.num_blocks_signed),
        now.num_blocks_to_sign.checked_sub(then.num_blocks_to_sign),
    ) else {
        return ComputedSigning {
            signed: 0,
            to_sign: 0,
            percentage: Dec::zero(),
            is_below_threshold: true,
        };
    };

    if to_sign == 0 {
        return ComputedSigning {
            signed,
            to_sign,
            percentage: Dec::zero(),
            is_below_threshold: false,
        };
    }

    let percentage = Dec::from_int(signed)
        .quo(Dec::from_int(to_sign))
        .unwrap_or_default();
    // signed / to_sign <= 2/3, without rounding
    let is_below_threshold = u128::from(signed) * 3 <= u128::from(to_sign) * 2;

    ComputedSigning {
        signed,
        to_sign,
        percentage,
        is_below_threshold,
    }
}

/// Whether a validator may enter the EPoS auction.
///
/// Validators that sat on the committee of the snapshot epoch must have
/// signed enough blocks; after that, only active validators are eligible.
pub fn is_eligible_for_epos_auction(
    snapshot: &ValidatorSnapshot,
    validator: &ValidatorRecord,
) -> bool {
    if validator.last_epoch_in_committee == snapshot.epoch
        && compute_current_signing(snapshot, validator).is_below_threshold
    {
        return false;
    }
    matches!(validator.status, ValidatorStatus::Active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlsPublicKey, SigningCounters};

    fn validator(
        status: ValidatorStatus,
        last_epoch: u64,
        to_sign: u64,
        signed: u64,
    ) -> ValidatorRecord {
        let mut v =
            ValidatorRecord::new([1u8; 20], vec![BlsPublicKey([1u8; 48])]).with_status(status);
        v.last_epoch_in_committee = last_epoch;
        v.counters = SigningCounters::new(to_sign, signed);
        v
    }

    fn snapshot(epoch: u64, to_sign: u64, signed: u64) -> ValidatorSnapshot {
        ValidatorSnapshot {
            epoch,
            counters: SigningCounters::new(to_sign, signed),
        }
    }

    #[test]
    fn test_active_without_history_is_eligible() {
        let v = validator(ValidatorStatus::Active, 0, 0, 0);
        assert!(is_eligible_for_epos_auction(&snapshot(5, 0, 0), &v));
    }

    #[test]
    fn test_inactive_without_history_is_ineligible() {
        let v = validator(ValidatorStatus::Inactive, 0, 0, 0);
        assert!(!is_eligible_for_epos_auction(&snapshot(5, 0, 0), &v));
        let banned = validator(ValidatorStatus::Banned, 0, 0, 0);
        assert!(!is_eligible_for_epos_auction(&snapshot(5, 0, 0), &banned));
    }

    #[test]
    fn test_committee_member_with_poor_signing_is_ineligible() {
        // 100 to sign, 60 signed since snapshot: 60% <= 66.6%
        let v = validator(ValidatorStatus::Active, 5, 200, 160);
        assert!(!is_eligible_for_epos_auction(&snapshot(5, 100, 100), &v));
    }

    #[test]
    fn test_committee_member_with_good_signing_is_eligible() {
        let v = validator(ValidatorStatus::Active, 5, 200, 190);
        assert!(is_eligible_for_epos_auction(&snapshot(5, 100, 100), &v));
    }

    #[test]
    fn test_good_signing_does_not_override_status() {
        let v = validator(ValidatorStatus::Inactive, 5, 200, 200);
        assert!(!is_eligible_for_epos_auction(&snapshot(5, 100, 100), &v));
    }

    #[test]
    fn test_poor_signing_ignored_outside_snapshot_epoch() {
        let v = validator(ValidatorStatus::Active, 4, 200, 100);
        assert!(is_eligible_for_epos_auction(&snapshot(5, 100, 100), &v));
    }

    #[test]
    fn test_exact_two_thirds_is_below_threshold() {
        let v = validator(ValidatorStatus::Active, 1, 3, 2);
        let computed = compute_current_signing(&snapshot(1, 0, 0), &v);
        assert!(computed.is_below_threshold);
        assert_eq!(computed.to_sign, 3);

        let v = validator(ValidatorStatus::Active, 1, 300, 201);
        assert!(!compute_current_signing(&snapshot(1, 0, 0), &v).is_below_threshold);
    }

    #[test]
    fn test_nothing_to_sign_is_not_below_threshold() {
        let v = validator(ValidatorStatus::Active, 1, 10, 10);
        let computed = compute_current_signing(&snapshot(1, 10, 10), &v);
        assert!(!computed.is_below_threshold);
        assert!(computed.percentage.is_zero());
    }

    #[test]
    fn test_regressed_counters_are_below_threshold() {
        let v = validator(ValidatorStatus::Active, 1, 5, 5);
        assert!(compute_current_signing(&snapshot(1, 10, 10), &v).is_below_threshold);
    }
}
