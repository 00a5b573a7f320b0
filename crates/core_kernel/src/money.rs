//! Money and ownership-share types with precise decimal arithmetic
//!
//! This module provides the two numeric value types the billing domain is
//! built on, using rust_decimal so that no floating-point error can creep
//! into invoice amounts or share calculations.
//!
//! Amounts are stored with 2 decimal places (`NUMERIC(10,2)` in the
//! database), share ratios with 3 (`NUMERIC(7,3)`). Both round half-up,
//! matching how the association's charges have always been computed.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use thiserror::Error;

/// Decimal places for monetary amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// Decimal places for ownership share ratios.
pub const SHARE_SCALE: u32 = 3;

/// Errors that can occur when constructing money values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount must not be negative, got {0}")]
    NegativeAmount(Decimal),

    #[error("Share ratio must be strictly positive, got {0}")]
    NonPositiveShare(Decimal),
}

/// A monetary amount in the association's currency
///
/// Always normalized to 2 decimal places with half-up rounding. The sign is
/// unconstrained: payments may legitimately carry corrections with negative
/// amounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Creates an amount, rounding half-up to 2 decimal places
    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp_with_strategy(
            AMOUNT_SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }

    /// Creates an amount from whole currency units
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::new(units, 0))
    }

    /// The zero amount
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Creates an amount that must not be negative (billing totals, invoice
    /// amounts)
    pub fn non_negative(value: Decimal) -> Result<Self, MoneyError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MoneyError::NegativeAmount(value));
        }
        Ok(Self::new(value))
    }

    /// Returns the underlying decimal value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Rounds to whole currency units, half-up
    pub fn to_whole(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.0 + other.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.0 - other.0)
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, a| acc + a)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Decimal {
        amount.0
    }
}

/// A property's ownership share, the weight used to split a billing
///
/// Must be strictly positive; a property with no share cannot be billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareRatio(Decimal);

impl ShareRatio {
    /// Creates a share ratio, rounding half-up to 3 decimal places
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value <= Decimal::ZERO {
            return Err(MoneyError::NonPositiveShare(value));
        }
        Ok(Self(value.round_dp_with_strategy(
            SHARE_SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        )))
    }

    /// Returns the underlying decimal value
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for ShareRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_rounds_half_up() {
        assert_eq!(Amount::new(dec!(10.005)).value(), dec!(10.01));
        assert_eq!(Amount::new(dec!(10.004)).value(), dec!(10.00));
        assert_eq!(Amount::new(dec!(-10.005)).value(), dec!(-10.01));
    }

    #[test]
    fn test_amount_to_whole() {
        assert_eq!(Amount::new(dec!(99.50)).to_whole().value(), dec!(100));
        assert_eq!(Amount::new(dec!(99.49)).to_whole().value(), dec!(99));
    }

    #[test]
    fn test_amount_arithmetic() {
        let a = Amount::new(dec!(100.00));
        let b = Amount::new(dec!(40.50));

        assert_eq!((a + b).value(), dec!(140.50));
        assert_eq!((a - b).value(), dec!(59.50));
        assert_eq!((-b).value(), dec!(-40.50));
    }

    #[test]
    fn test_amount_sum() {
        let total: Amount = [dec!(1.25), dec!(2.50), dec!(3.25)]
            .into_iter()
            .map(Amount::new)
            .sum();
        assert_eq!(total.value(), dec!(7.00));
    }

    #[test]
    fn test_amount_non_negative() {
        assert!(Amount::non_negative(dec!(0)).is_ok());
        assert!(matches!(
            Amount::non_negative(dec!(-0.01)),
            Err(MoneyError::NegativeAmount(_))
        ));
    }

    #[test]
    fn test_share_ratio_requires_positive() {
        assert!(ShareRatio::new(dec!(0.593)).is_ok());
        assert!(matches!(
            ShareRatio::new(dec!(0)),
            Err(MoneyError::NonPositiveShare(_))
        ));
        assert!(matches!(
            ShareRatio::new(dec!(-1)),
            Err(MoneyError::NonPositiveShare(_))
        ));
    }

    #[test]
    fn test_share_ratio_scale() {
        let share = ShareRatio::new(dec!(2.7325)).unwrap();
        assert_eq!(share.value(), dec!(2.733));
    }

    #[test]
    fn test_amount_serde_transparent() {
        let amount = Amount::new(dec!(457.00));
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"457.00\"");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    proptest! {
        #[test]
        fn amount_addition_is_commutative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64
        ) {
            let ma = Amount::new(Decimal::new(a, 2));
            let mb = Amount::new(Decimal::new(b, 2));

            prop_assert_eq!(ma + mb, mb + ma);
        }

        #[test]
        fn amount_whole_rounding_is_within_half_unit(
            cents in -1_000_000i64..1_000_000i64
        ) {
            let amount = Amount::new(Decimal::new(cents, 2));
            let diff = (amount.to_whole().value() - amount.value()).abs();

            prop_assert!(diff <= dec!(0.5));
        }
    }
}
