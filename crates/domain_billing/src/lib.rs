//! Billing Domain - Charge Allocation and Invoice Lifecycle
//!
//! This crate implements the billing core of the property owners'
//! association system:
//!
//! - **Allocation**: splitting an association-wide charge across properties
//!   in proportion to their ownership shares, with deterministic rounding.
//! - **Payment references**: generating and validating the checksummed
//!   reference number printed on every invoice.
//! - **Issuance**: materializing one invoice per property for a billing,
//!   with per-year monotonic invoice numbering.
//! - **Reconciliation**: applying payments to invoices and driving the
//!   invoice status state machine.
//!
//! Persistence is reached through the port traits in [`ports`]; the SQL
//! adapters live in the `infra_db` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::InvoiceService;
//!
//! let service = InvoiceService::new(invoices, billings, properties);
//! let created = service.issue_invoices(billing_id).await?;
//! ```

pub mod allocation;
pub mod billing;
pub mod error;
pub mod invoice;
pub mod payment;
pub mod ports;
pub mod property;
pub mod reference;
pub mod services;

pub use allocation::{allocate, AllocationError};
pub use billing::{Billing, BillingType, NewBilling};
pub use error::BillingError;
pub use invoice::{Invoice, InvoiceStatus, NewInvoice};
pub use payment::{NewPayment, Payment, PaymentMethod, PaymentUpdate};
pub use ports::{BillingStore, InvoiceStore, PaymentStore, PropertyStore, StoreError};
pub use property::Property;
pub use reference::ReferenceError;
pub use services::{BillingService, InvoiceService, PaymentService};
