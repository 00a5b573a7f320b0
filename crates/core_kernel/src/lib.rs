//! Core Kernel - Foundational types for the association billing system
//!
//! This crate provides the building blocks used across the domain and
//! infrastructure layers:
//! - `Amount` and `ShareRatio` with precise decimal arithmetic
//! - Numeric entity identifiers

pub mod identifiers;
pub mod money;

pub use identifiers::{BillingId, InvoiceId, OwnerId, PaymentId, PropertyId};
pub use money::{Amount, MoneyError, ShareRatio};
