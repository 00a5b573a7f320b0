//! Payment records
//!
//! A payment is one recorded receipt against an invoice. The amount sign is
//! deliberately unconstrained: manual corrections come in as negative rows
//! and simply feed the reconciliation sum.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{Amount, InvoiceId, PaymentId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BillingError;

/// How a payment arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Bank giro transfer
    BankGiro,
    /// Plus giro transfer
    PlusGiro,
    /// Instant mobile transfer
    InstantTransfer,
    /// Entered by hand by the treasurer
    Manual,
    /// Anything else
    Other,
}

impl PaymentMethod {
    /// Returns the canonical string form used in the database and at the API
    /// boundary
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankGiro => "BANK_GIRO",
            PaymentMethod::PlusGiro => "PLUS_GIRO",
            PaymentMethod::InstantTransfer => "INSTANT_TRANSFER",
            PaymentMethod::Manual => "MANUAL",
            PaymentMethod::Other => "OTHER",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BANK_GIRO" => Ok(PaymentMethod::BankGiro),
            "PLUS_GIRO" => Ok(PaymentMethod::PlusGiro),
            "INSTANT_TRANSFER" => Ok(PaymentMethod::InstantTransfer),
            "MANUAL" => Ok(PaymentMethod::Manual),
            "OTHER" => Ok(PaymentMethod::Other),
            other => Err(BillingError::InvalidPaymentMethod(other.to_string())),
        }
    }
}

/// A recorded receipt against one invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// The invoice this payment settles (or partially settles)
    pub invoice_id: InvoiceId,
    /// Paid amount; may be negative for corrections
    pub amount: Amount,
    /// Date the payment was received
    pub payment_date: NaiveDate,
    /// How the payment arrived
    pub method: PaymentMethod,
    /// Free-text comment
    pub comment: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Applies an update payload in place
    pub fn apply(&mut self, update: PaymentUpdate) {
        self.amount = update.amount;
        self.payment_date = update.payment_date;
        self.method = update.method;
        self.comment = update.comment;
    }
}

/// Data for creating a payment; the store assigns id and created_at
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub invoice_id: InvoiceId,
    pub amount: Amount,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub comment: Option<String>,
}

/// Mutable fields of a payment
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub amount: Amount,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_round_trip() {
        for method in [
            PaymentMethod::BankGiro,
            PaymentMethod::PlusGiro,
            PaymentMethod::InstantTransfer,
            PaymentMethod::Manual,
            PaymentMethod::Other,
        ] {
            let parsed: PaymentMethod = method.as_str().parse().unwrap();
            assert_eq!(parsed, method);
        }
    }

    #[test]
    fn test_payment_method_rejects_unknown() {
        assert!(matches!(
            "CASH".parse::<PaymentMethod>(),
            Err(BillingError::InvalidPaymentMethod(_))
        ));
    }
}
