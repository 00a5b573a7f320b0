//! Allocation engine
//!
//! Splits a billing's total amount (and optional extra charge) across
//! properties in proportion to their ownership shares.
//!
//! Each property's share is computed as `total × share / total_shares`,
//! rounded half-up to 2 decimals and then to whole currency units — the
//! association bills whole units only. The base amount and the extra charge
//! are rounded independently before summing.
//!
//! Because every property is rounded on its own, the allocations across a
//! billing can drift from the billing total by up to half a unit per
//! property. That drift is accepted; tests assert approximate equality with
//! an explicit tolerance rather than reconciling the remainder onto one
//! property.

use core_kernel::{Amount, ShareRatio};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::property::Property;

/// Errors from the allocation engine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    /// The sum of all share ratios must be strictly positive
    #[error("Total share ratio must be strictly positive, got {0}")]
    NonPositiveShareTotal(Decimal),
}

/// Computes one property's share of a billing
///
/// The extra charge, when present and strictly positive, is allocated by
/// the same weights and added on top of the base amount; each term is
/// rounded independently.
pub fn allocate(
    total: Amount,
    share: ShareRatio,
    total_shares: Decimal,
    extra: Option<Amount>,
) -> Result<Amount, AllocationError> {
    if total_shares <= Decimal::ZERO {
        return Err(AllocationError::NonPositiveShareTotal(total_shares));
    }

    let mut amount = share_of(total, share, total_shares);
    if let Some(extra) = extra {
        if extra.is_positive() {
            amount += share_of(extra, share, total_shares);
        }
    }

    Ok(amount)
}

/// Sums the share ratios of all properties, the allocation denominator
pub fn total_shares(properties: &[Property]) -> Decimal {
    properties.iter().map(|p| p.share_ratio.value()).sum()
}

fn share_of(total: Amount, share: ShareRatio, total_shares: Decimal) -> Amount {
    Amount::new(total.value() * share.value() / total_shares).to_whole()
}
