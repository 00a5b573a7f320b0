//! Persistence ports for the billing domain
//!
//! The domain reaches storage only through these traits. The PostgreSQL
//! adapters live in `infra_db`; the in-memory adapters used by tests live in
//! `test_utils`. Identifiers and created-at timestamps are assigned by the
//! store (database identity columns), which is why creation goes through the
//! `New*` draft types.

use async_trait::async_trait;
use chrono::NaiveDate;
use core_kernel::{BillingId, InvoiceId, PaymentId, PropertyId};
use std::fmt;
use thiserror::Error;

use crate::billing::{Billing, NewBilling};
use crate::invoice::{Invoice, InvoiceStatus, NewInvoice};
use crate::payment::{NewPayment, Payment};
use crate::property::Property;

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity was not found
    #[error("Not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation conflicts with existing data (unique constraint,
    /// foreign key)
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The underlying storage failed
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Creates a NotFound error
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        StoreError::Conflict {
            message: message.into(),
        }
    }

    /// Creates a Storage error without a source
    pub fn storage(message: impl Into<String>) -> Self {
        StoreError::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Store for billing events
#[async_trait]
pub trait BillingStore: Send + Sync {
    async fn find(&self, id: BillingId) -> Result<Option<Billing>, StoreError>;
    async fn list_by_year(&self, year: i32) -> Result<Vec<Billing>, StoreError>;
    async fn insert(&self, billing: NewBilling) -> Result<Billing, StoreError>;
    async fn update(&self, billing: &Billing) -> Result<(), StoreError>;
    async fn delete(&self, id: BillingId) -> Result<(), StoreError>;
}

/// Store for properties
///
/// Property CRUD itself is owned by an external collaborator; the billing
/// core only reads.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn find(&self, id: PropertyId) -> Result<Option<Property>, StoreError>;
    async fn list_all(&self) -> Result<Vec<Property>, StoreError>;
}

/// Store for invoices and the per-year sequence counter
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn find(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Invoice>, StoreError>;
    async fn list_by_billing(&self, id: BillingId) -> Result<Vec<Invoice>, StoreError>;
    async fn list_by_property(&self, id: PropertyId) -> Result<Vec<Invoice>, StoreError>;
    async fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, StoreError>;
    async fn count_by_billing(&self, id: BillingId) -> Result<u64, StoreError>;

    /// Inserts a batch of invoices and returns them with assigned ids,
    /// invoice numbers, and payment references.
    ///
    /// Implementations persist the whole batch atomically and reserve each
    /// invoice's per-year sequence number inside that same transaction: a
    /// failed batch rolls the counter back, so the next issuance reuses the
    /// numbers and the year stays gapless. The counter is shared by all
    /// billings of the same year; two concurrent issuances must never
    /// observe the same sequence value. Number and reference come from
    /// [`NewInvoice::numbering`].
    async fn insert_all(
        &self,
        year: i32,
        invoices: Vec<NewInvoice>,
    ) -> Result<Vec<Invoice>, StoreError>;

    async fn update(&self, invoice: &Invoice) -> Result<(), StoreError>;
}

/// Store for payments
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn find(&self, id: PaymentId) -> Result<Option<Payment>, StoreError>;
    async fn list_by_invoice(&self, id: InvoiceId) -> Result<Vec<Payment>, StoreError>;
    async fn list_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Payment>, StoreError>;
    async fn insert(&self, payment: NewPayment) -> Result<Payment, StoreError>;
    async fn update(&self, payment: &Payment) -> Result<(), StoreError>;
    async fn delete(&self, id: PaymentId) -> Result<(), StoreError>;
}
