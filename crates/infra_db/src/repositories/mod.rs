//! Repository implementations of the domain persistence ports
//!
//! One repository per aggregate, each a thin PgPool wrapper. Rows are read
//! into `FromRow` structs and converted to domain types at the edge; a value
//! that no longer parses (an unknown status string, a non-positive share)
//! surfaces as a storage error rather than a panic.

mod billing;
mod invoice;
mod payment;
mod property;

pub use billing::BillingRepository;
pub use invoice::InvoiceRepository;
pub use payment::PaymentRepository;
pub use property::PropertyRepository;

use crate::error::DatabaseError;
use domain_billing::StoreError;

/// Converts a row-level mapping failure into a `StoreError`
pub(crate) fn corrupt_row(message: impl Into<String>) -> StoreError {
    DatabaseError::CorruptRow(message.into()).into()
}
