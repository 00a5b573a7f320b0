//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for the billing domain's persistence ports, built on
//! SQLx. Each repository implements one port trait from `domain_billing`;
//! the domain never sees SQL or connection handling.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, InvoiceRepository};
//!
//! let pool = create_pool(DatabaseConfig::new(&url)).await?;
//! let invoices = InvoiceRepository::new(pool.clone());
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod repositories;

pub use config::AppConfig;
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::{
    BillingRepository, InvoiceRepository, PaymentRepository, PropertyRepository,
};
