//! Invoices and the payment-driven status state machine
//!
//! One invoice is a single property's obligation for one billing. Its
//! status moves through the lifecycle below; the payment-driven part is
//! recomputed from the full payment sum on every payment mutation.
//!
//! ```text
//! CREATED --mark_sent--> SENT --sweep--> OVERDUE
//!                          |
//!                          +--payments--> PARTIALLY_PAID <--> PAID
//!
//! CANCELLED is terminal, reachable from any non-paid state, and never
//! overwritten by payment recomputation.
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{Amount, BillingId, InvoiceId, PropertyId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BillingError;
use crate::reference::{self, ReferenceError};

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Issued but not yet dispatched
    Created,
    /// Dispatched to the property owner
    Sent,
    /// Payments cover part of the amount
    PartiallyPaid,
    /// Payments cover the full amount
    Paid,
    /// Past due date without full payment
    Overdue,
    /// Voided; terminal
    Cancelled,
}

impl InvoiceStatus {
    /// Returns the canonical string form used in the database and at the API
    /// boundary
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Created => "CREATED",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::PartiallyPaid => "PARTIALLY_PAID",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(InvoiceStatus::Created),
            "SENT" => Ok(InvoiceStatus::Sent),
            "PARTIALLY_PAID" => Ok(InvoiceStatus::PartiallyPaid),
            "PAID" => Ok(InvoiceStatus::Paid),
            "OVERDUE" => Ok(InvoiceStatus::Overdue),
            "CANCELLED" => Ok(InvoiceStatus::Cancelled),
            other => Err(BillingError::InvalidStatus(other.to_string())),
        }
    }
}

/// One property's obligation for one billing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// The billing this invoice belongs to
    pub billing_id: BillingId,
    /// The property being billed
    pub property_id: PropertyId,
    /// Allocated share of the billing's total
    pub amount: Amount,
    /// Due date, copied from the billing at issuance
    pub due_date: NaiveDate,
    /// Unique invoice number, `"{year}-{sequence}"`
    pub invoice_number: String,
    /// Unique checksummed payment reference
    pub reference: String,
    /// Current lifecycle status
    pub status: InvoiceStatus,
    /// Rendered invoice document, stored by the out-of-scope renderer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Vec<u8>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Marks the invoice as dispatched
    ///
    /// Only a `CREATED` invoice transitions; for every other status this is
    /// an idempotent no-op. Returns whether the status changed.
    pub fn mark_sent(&mut self) -> bool {
        if self.status == InvoiceStatus::Created {
            self.status = InvoiceStatus::Sent;
            self.touch();
            true
        } else {
            false
        }
    }

    /// Cancels the invoice
    ///
    /// Allowed from any non-paid state; cancellation is terminal. Cancelling
    /// an already cancelled invoice is a no-op.
    pub fn cancel(&mut self) -> Result<(), BillingError> {
        match self.status {
            InvoiceStatus::Paid => Err(BillingError::CancelPaidInvoice(self.id)),
            InvoiceStatus::Cancelled => Ok(()),
            _ => {
                self.status = InvoiceStatus::Cancelled;
                self.touch();
                Ok(())
            }
        }
    }

    /// Recomputes the payment-driven status from the sum of all payments
    ///
    /// A full payment caps at `PAID` even when overpaid. When the sum drops
    /// back to zero (the last payment was deleted) the invoice reverts to
    /// `SENT`, never to `CREATED`. Cancelled invoices are excluded entirely.
    /// Returns whether the status changed.
    pub fn apply_payment_total(&mut self, total_paid: Amount) -> bool {
        if self.status == InvoiceStatus::Cancelled {
            return false;
        }

        let new_status = if total_paid >= self.amount {
            InvoiceStatus::Paid
        } else if total_paid.is_positive() {
            InvoiceStatus::PartiallyPaid
        } else if matches!(
            self.status,
            InvoiceStatus::Paid | InvoiceStatus::PartiallyPaid
        ) {
            InvoiceStatus::Sent
        } else {
            self.status
        };

        if new_status != self.status {
            self.status = new_status;
            self.touch();
            true
        } else {
            false
        }
    }

    /// Returns true if the due date is strictly before `today`
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        today > self.due_date
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Data for creating an invoice
///
/// The store assigns id, timestamps, and the initial `CREATED` status. The
/// per-year sequence number is reserved inside the insert transaction, and
/// the store derives the invoice number and payment reference from it via
/// [`NewInvoice::numbering`].
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub billing_id: BillingId,
    pub property_id: PropertyId,
    pub amount: Amount,
    pub due_date: NaiveDate,
}

impl NewInvoice {
    /// Derives the invoice number and payment reference for a reserved
    /// per-year sequence number
    pub fn numbering(
        &self,
        year: i32,
        sequence: u32,
    ) -> Result<(String, String), ReferenceError> {
        let invoice_number = format!("{year}-{sequence}");
        let payment_reference = reference::generate(year, self.property_id, sequence)?;
        Ok((invoice_number, payment_reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(status: InvoiceStatus) -> Invoice {
        Invoice {
            id: InvoiceId::new(1),
            billing_id: BillingId::new(1),
            property_id: PropertyId::new(1),
            amount: Amount::new(dec!(500.00)),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            invoice_number: "2025-1".to_string(),
            reference: "250001011".to_string(),
            status,
            document: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            InvoiceStatus::Created,
            InvoiceStatus::Sent,
            InvoiceStatus::PartiallyPaid,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Cancelled,
        ] {
            let parsed: InvoiceStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_rejects_unknown() {
        assert!(matches!(
            "SETTLED".parse::<InvoiceStatus>(),
            Err(BillingError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_mark_sent_only_from_created() {
        let mut created = invoice(InvoiceStatus::Created);
        assert!(created.mark_sent());
        assert_eq!(created.status, InvoiceStatus::Sent);

        // Idempotent on everything else
        let mut paid = invoice(InvoiceStatus::Paid);
        assert!(!paid.mark_sent());
        assert_eq!(paid.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_full_payment_transitions_to_paid() {
        let mut inv = invoice(InvoiceStatus::Sent);
        assert!(inv.apply_payment_total(Amount::new(dec!(500.00))));
        assert_eq!(inv.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_overpayment_caps_at_paid() {
        let mut inv = invoice(InvoiceStatus::Sent);
        inv.apply_payment_total(Amount::new(dec!(750.00)));
        assert_eq!(inv.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_partial_payment() {
        let mut inv = invoice(InvoiceStatus::Sent);
        inv.apply_payment_total(Amount::new(dec!(100.00)));
        assert_eq!(inv.status, InvoiceStatus::PartiallyPaid);
    }

    #[test]
    fn test_zero_total_reverts_to_sent_not_created() {
        let mut inv = invoice(InvoiceStatus::PartiallyPaid);
        assert!(inv.apply_payment_total(Amount::zero()));
        assert_eq!(inv.status, InvoiceStatus::Sent);
    }

    #[test]
    fn test_zero_total_leaves_created_untouched() {
        let mut inv = invoice(InvoiceStatus::Created);
        assert!(!inv.apply_payment_total(Amount::zero()));
        assert_eq!(inv.status, InvoiceStatus::Created);
    }

    #[test]
    fn test_partial_payment_moves_overdue_to_partially_paid() {
        let mut inv = invoice(InvoiceStatus::Overdue);
        inv.apply_payment_total(Amount::new(dec!(1.00)));
        assert_eq!(inv.status, InvoiceStatus::PartiallyPaid);
    }

    #[test]
    fn test_cancelled_excluded_from_recomputation() {
        let mut inv = invoice(InvoiceStatus::Cancelled);
        assert!(!inv.apply_payment_total(Amount::new(dec!(500.00))));
        assert_eq!(inv.status, InvoiceStatus::Cancelled);
    }

    #[test]
    fn test_cancel_from_non_paid_states() {
        for status in [
            InvoiceStatus::Created,
            InvoiceStatus::Sent,
            InvoiceStatus::PartiallyPaid,
            InvoiceStatus::Overdue,
        ] {
            let mut inv = invoice(status);
            inv.cancel().unwrap();
            assert_eq!(inv.status, InvoiceStatus::Cancelled);
        }
    }

    #[test]
    fn test_cancel_paid_is_rejected() {
        let mut inv = invoice(InvoiceStatus::Paid);
        assert!(matches!(
            inv.cancel(),
            Err(BillingError::CancelPaidInvoice(_))
        ));
        assert_eq!(inv.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_numbering_derives_number_and_reference() {
        let draft = NewInvoice {
            billing_id: BillingId::new(1),
            property_id: PropertyId::new(15),
            amount: Amount::new(dec!(500.00)),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        };

        let (number, reference) = draft.numbering(2025, 2).unwrap();
        assert_eq!(number, "2025-2");
        assert_eq!(reference, "250015021");
    }

    #[test]
    fn test_numbering_fails_for_oversized_property_id() {
        let draft = NewInvoice {
            billing_id: BillingId::new(1),
            property_id: PropertyId::new(10_000),
            amount: Amount::new(dec!(500.00)),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        };

        assert_eq!(
            draft.numbering(2025, 1),
            Err(ReferenceError::PropertyIdOutOfRange(10_000))
        );
    }

    #[test]
    fn test_is_past_due_is_strict() {
        let inv = invoice(InvoiceStatus::Sent);
        let due = inv.due_date;

        assert!(!inv.is_past_due(due));
        assert!(inv.is_past_due(due.succ_opt().unwrap()));
    }
}
