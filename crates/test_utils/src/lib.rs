//! Test Utilities
//!
//! Support code for testing the billing domain:
//! - In-memory implementations of the persistence ports
//! - Builders for test entities with sensible defaults
//! - Assertion helpers for amounts

pub mod assertions;
pub mod builders;
pub mod memory;

pub use builders::{BillingBuilder, PropertyBuilder};
pub use memory::{InMemoryBillings, InMemoryInvoices, InMemoryPayments, InMemoryProperties};
