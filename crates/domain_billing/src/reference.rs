//! Payment reference generation and validation
//!
//! Every invoice carries a 9-digit numeric payment reference (the "OCR
//! number" on Swedish giro forms) that incoming payments are matched
//! against. The layout is fixed:
//!
//! ```text
//! YY PPPP NN C
//! │  │    │  └ mod-10 check digit
//! │  │    └─── invoice sequence within the year, zero-padded
//! │  └──────── property id, zero-padded
//! └─────────── last two digits of the billing year
//! ```
//!
//! The check digit is the classic mod-10 scheme: scanning right to left,
//! every second digit starting with the rightmost is doubled, doubled values
//! above 9 have their digits summed, and the check digit brings the total to
//! the next multiple of ten. This detects all single-digit errors and most
//! transpositions.
//!
//! All functions here are pure; encoding fails loudly when a field does not
//! fit its fixed width instead of truncating.

use core_kernel::PropertyId;
use thiserror::Error;

/// Total length of a generated reference, payload plus check digit.
pub const REFERENCE_LEN: usize = 9;

/// Highest property id that fits the 4-digit field.
const PROPERTY_FIELD_MAX: i64 = 9_999;

/// Highest sequence number that fits the 2-digit field.
const SEQUENCE_FIELD_MAX: u32 = 99;

/// Errors from encoding a payment reference
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    /// The property id does not fit the 4-digit field
    #[error("Property id {0} does not fit the 4-digit reference field")]
    PropertyIdOutOfRange(i64),

    /// The sequence does not fit the 2-digit field
    #[error("Invoice sequence {0} does not fit the 2-digit reference field")]
    SequenceOutOfRange(u32),
}

/// Generates the payment reference for an invoice
///
/// Uses only the last two digits of `year`. Fails when the property id or
/// the sequence number overflows its fixed-width field.
pub fn generate(
    year: i32,
    property_id: PropertyId,
    sequence: u32,
) -> Result<String, ReferenceError> {
    ensure_property_id_fits(property_id)?;
    if sequence > SEQUENCE_FIELD_MAX {
        return Err(ReferenceError::SequenceOutOfRange(sequence));
    }

    let payload = format!(
        "{:02}{:04}{:02}",
        year.rem_euclid(100),
        property_id.value(),
        sequence
    );
    let digit = mod10_check_digit(payload.bytes().map(|b| u32::from(b - b'0')));

    Ok(format!("{payload}{digit}"))
}

/// Checks that a property id fits the 4-digit reference field
///
/// Issuance runs this up front for every property so a register containing
/// an unencodable id fails before any invoice is written.
pub fn ensure_property_id_fits(property_id: PropertyId) -> Result<(), ReferenceError> {
    let pid = property_id.value();
    if (0..=PROPERTY_FIELD_MAX).contains(&pid) {
        Ok(())
    } else {
        Err(ReferenceError::PropertyIdOutOfRange(pid))
    }
}

/// Computes the check digit over a numeric payload
///
/// Returns `None` if the payload is empty or contains a non-digit.
pub fn check_digit(payload: &str) -> Option<u32> {
    if payload.is_empty() || !payload.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(mod10_check_digit(
        payload.bytes().map(|b| u32::from(b - b'0')),
    ))
}

/// Validates a complete reference including its trailing check digit
///
/// Fails closed: malformed input (too short, non-numeric) is simply invalid.
pub fn validate(reference: &str) -> bool {
    if reference.len() < 2 || !reference.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let (payload, check) = reference.split_at(reference.len() - 1);
    match (check_digit(payload), check.parse::<u32>()) {
        (Some(expected), Ok(provided)) => expected == provided,
        _ => false,
    }
}

/// Extracts the 2-digit year field from a reference
pub fn extract_year(reference: &str) -> Option<&str> {
    reference.get(0..2)
}

/// Extracts the property id field from a reference
pub fn extract_property_id(reference: &str) -> Option<PropertyId> {
    let field = reference.get(2..6)?;
    field.parse::<i64>().ok().map(PropertyId::new)
}

/// Extracts the invoice sequence field from a reference
pub fn extract_sequence(reference: &str) -> Option<u32> {
    let field = reference.get(6..8)?;
    field.parse().ok()
}

/// Mod-10 over digits in payload order: double every second digit starting
/// with the rightmost, digit-sum doubles above 9, and return the complement
/// of the total modulo 10.
fn mod10_check_digit(digits: impl DoubleEndedIterator<Item = u32>) -> u32 {
    let sum: u32 = digits
        .rev()
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    (10 - (sum % 10)) % 10
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn generated_reference_always_validates(
            year in 1900i32..3000,
            pid in 0i64..10_000,
            seq in 0u32..100
        ) {
            let reference = generate(year, PropertyId::new(pid), seq).unwrap();

            prop_assert_eq!(reference.len(), REFERENCE_LEN);
            prop_assert!(validate(&reference));
            prop_assert_eq!(extract_property_id(&reference), Some(PropertyId::new(pid)));
            prop_assert_eq!(extract_sequence(&reference), Some(seq));
        }

        #[test]
        fn single_digit_errors_are_detected(
            pid in 0i64..10_000,
            seq in 0u32..100,
            pos in 0usize..REFERENCE_LEN,
            bump in 1u8..10
        ) {
            let reference = generate(2025, PropertyId::new(pid), seq).unwrap();
            let mut mutated = reference.clone().into_bytes();
            mutated[pos] = b'0' + (mutated[pos] - b'0' + bump) % 10;
            let mutated = String::from_utf8(mutated).unwrap();

            prop_assert!(!validate(&mutated));
        }
    }
}
