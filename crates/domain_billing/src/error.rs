//! Billing domain errors

use core_kernel::{BillingId, InvoiceId, PaymentId, PropertyId};
use thiserror::Error;

use crate::allocation::AllocationError;
use crate::ports::StoreError;
use crate::reference::ReferenceError;

/// Errors that can occur in the billing domain
///
/// Variants fall into four groups: not-found, invalid-argument,
/// illegal-state, and allocation/storage failures. All of them propagate to
/// the caller unmodified; the domain never retries.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Billing not found
    #[error("Billing not found: {0}")]
    BillingNotFound(BillingId),

    /// Property not found
    #[error("Property not found: {0}")]
    PropertyNotFound(PropertyId),

    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Payment not found
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// No invoice carries the given payment reference
    #[error("No invoice found for payment reference: {0}")]
    NoInvoiceForReference(String),

    /// A payment reference failed checksum validation
    #[error("Invalid payment reference: {0}")]
    InvalidReference(String),

    /// Unknown invoice status string at the boundary
    #[error("Unknown invoice status: {0}")]
    InvalidStatus(String),

    /// Unknown payment method string at the boundary
    #[error("Unknown payment method: {0}")]
    InvalidPaymentMethod(String),

    /// Unknown billing type string at the boundary
    #[error("Unknown billing type: {0}")]
    InvalidBillingType(String),

    /// A billing with remaining invoices cannot be deleted
    #[error("Billing {0} still has invoices and cannot be deleted")]
    BillingHasInvoices(BillingId),

    /// A paid invoice cannot be cancelled
    #[error("Invoice {0} is paid and cannot be cancelled")]
    CancelPaidInvoice(InvoiceId),

    /// Reference encoding failed
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Allocation failed
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// A monetary value was out of range
    #[error(transparent)]
    Money(#[from] core_kernel::MoneyError),

    /// The persistence boundary failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BillingError {
    /// Returns true if this error indicates a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BillingError::BillingNotFound(_)
                | BillingError::PropertyNotFound(_)
                | BillingError::InvoiceNotFound(_)
                | BillingError::PaymentNotFound(_)
                | BillingError::NoInvoiceForReference(_)
                | BillingError::Store(StoreError::NotFound { .. })
        )
    }

    /// Returns true if this error indicates a rejected argument
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            BillingError::InvalidReference(_)
                | BillingError::InvalidStatus(_)
                | BillingError::InvalidPaymentMethod(_)
                | BillingError::InvalidBillingType(_)
                | BillingError::Reference(_)
                | BillingError::Money(_)
        )
    }

    /// Returns true if this error indicates a structural conflict
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BillingError::BillingHasInvoices(_)
                | BillingError::CancelPaidInvoice(_)
                | BillingError::Store(StoreError::Conflict { .. })
        )
    }
}
