//! Overdue invoice sweep
//!
//! Moves every SENT invoice whose due date has passed to OVERDUE. Intended
//! to run once a day from cron; safe to run more often, already-overdue
//! invoices are left alone.

use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use domain_billing::InvoiceService;
use infra_db::{
    create_pool, AppConfig, BillingRepository, DatabaseConfig, InvoiceRepository,
    PropertyRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let pool = create_pool(
        DatabaseConfig::new(&config.database_url).max_connections(config.max_connections),
    )
    .await
    .context("failed to create database pool")?;

    let invoices = Arc::new(InvoiceRepository::new(pool.clone()));
    let billings = Arc::new(BillingRepository::new(pool.clone()));
    let properties = Arc::new(PropertyRepository::new(pool));
    let service = InvoiceService::new(invoices, billings, properties);

    let today = Utc::now().date_naive();
    let marked = service
        .sweep_overdue(today)
        .await
        .context("overdue sweep failed")?;

    info!(marked, %today, "sweep complete");
    Ok(())
}
