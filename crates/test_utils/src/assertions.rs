//! Custom Test Assertions
//!
//! Assertion helpers for amounts that give more meaningful error messages
//! than standard assertions.

use core_kernel::Amount;
use rust_decimal::Decimal;

/// Asserts that two amounts are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the amounts differ by more than the tolerance
pub fn assert_amount_approx_eq(actual: Amount, expected: Amount, tolerance: Decimal) {
    let diff = (actual.value() - expected.value()).abs();
    assert!(
        diff <= tolerance,
        "Amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual,
        expected,
        diff,
        tolerance
    );
}

/// Asserts that amounts sum to within a tolerance of a total
///
/// # Panics
///
/// Panics if the sum of parts is further than tolerance from the total
pub fn assert_amount_sum_within(parts: &[Amount], total: Amount, tolerance: Decimal) {
    let sum: Amount = parts.iter().copied().sum();
    let diff = (sum.value() - total.value()).abs();
    assert!(
        diff <= tolerance,
        "Sum of parts ({}) is further than {} from total ({}), diff={}",
        sum,
        tolerance,
        total,
        diff
    );
}

/// Asserts that a result is Ok and returns the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Asserts that a result is Err and returns the error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        match $result {
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => e,
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => panic!("{}: got Ok({:?})", $msg, value),
            Err(e) => e,
        }
    };
}
