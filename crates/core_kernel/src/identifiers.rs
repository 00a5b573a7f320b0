//! Strongly-typed identifiers for domain entities
//!
//! Newtype wrappers around the database's i64 identity columns. The payment
//! reference encodes the property id as a fixed-width digit field, so
//! identifiers here are numeric rather than UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw database value
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw value
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(BillingId);
define_id!(PropertyId);
define_id!(InvoiceId);
define_id!(PaymentId);
define_id!(OwnerId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(PropertyId::new(15).to_string(), "15");
    }

    #[test]
    fn test_id_parsing() {
        let parsed: InvoiceId = "42".parse().unwrap();
        assert_eq!(parsed, InvoiceId::new(42));
        assert!("not-a-number".parse::<InvoiceId>().is_err());
    }

    #[test]
    fn test_id_round_trip() {
        let id = BillingId::new(7);
        let raw: i64 = id.into();
        assert_eq!(BillingId::from(raw), id);
    }
}
