//! Invoice repository
//!
//! Besides row access this repository owns the per-year invoice sequence,
//! implemented as an upsert on the `invoice_counters` table so concurrent
//! issuances serialize on the row lock and never observe the same value.
//! The upsert runs inside the batch-insert transaction: a failed batch
//! rolls the counter back along with the rows.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use core_kernel::{Amount, BillingId, InvoiceId, PropertyId};
use domain_billing::{Invoice, InvoiceStatus, InvoiceStore, NewInvoice, StoreError};

use crate::error::store_err;
use crate::repositories::corrupt_row;

/// PostgreSQL-backed [`InvoiceStore`]
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    /// Creates a repository over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct InvoiceRow {
    id: i64,
    billing_id: i64,
    property_id: i64,
    amount: Decimal,
    due_date: NaiveDate,
    invoice_number: String,
    reference: String,
    status: String,
    document: Option<Vec<u8>>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = StoreError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let status: InvoiceStatus = row
            .status
            .parse()
            .map_err(|_| corrupt_row(format!("unknown invoice status '{}'", row.status)))?;

        Ok(Invoice {
            id: InvoiceId::new(row.id),
            billing_id: BillingId::new(row.billing_id),
            property_id: PropertyId::new(row.property_id),
            amount: Amount::new(row.amount),
            due_date: row.due_date,
            invoice_number: row.invoice_number,
            reference: row.reference,
            status,
            document: row.document,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, billing_id, property_id, amount, due_date, invoice_number, \
     reference, status, document, created_at, updated_at";

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    async fn find(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(Invoice::try_from).transpose()
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Invoice>, StoreError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM invoices WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(Invoice::try_from).transpose()
    }

    async fn list_by_billing(&self, id: BillingId) -> Result<Vec<Invoice>, StoreError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM invoices WHERE billing_id = $1 ORDER BY id"
        ))
        .bind(id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    async fn list_by_property(&self, id: PropertyId) -> Result<Vec<Invoice>, StoreError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM invoices WHERE property_id = $1 ORDER BY id"
        ))
        .bind(id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    async fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, StoreError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM invoices WHERE status = $1 ORDER BY id"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    async fn count_by_billing(&self, id: BillingId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE billing_id = $1")
            .bind(id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(count as u64)
    }

    async fn insert_all(
        &self,
        year: i32,
        invoices: Vec<NewInvoice>,
    ) -> Result<Vec<Invoice>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let mut created = Vec::with_capacity(invoices.len());
        for draft in invoices {
            // Reserved on the transaction connection: a rolled-back batch
            // returns the sequence numbers, keeping the year gapless.
            let sequence: i32 = sqlx::query_scalar(
                "INSERT INTO invoice_counters (year, last_value) VALUES ($1, 1) \
                 ON CONFLICT (year) DO UPDATE SET last_value = invoice_counters.last_value + 1 \
                 RETURNING last_value",
            )
            .bind(year)
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?;

            let (invoice_number, reference) = draft
                .numbering(year, sequence as u32)
                .map_err(|e| StoreError::conflict(e.to_string()))?;

            let row: InvoiceRow = sqlx::query_as(&format!(
                "INSERT INTO invoices \
                     (billing_id, property_id, amount, due_date, invoice_number, reference, status) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 RETURNING {SELECT_COLUMNS}"
            ))
            .bind(draft.billing_id.value())
            .bind(draft.property_id.value())
            .bind(draft.amount.value())
            .bind(draft.due_date)
            .bind(&invoice_number)
            .bind(&reference)
            .bind(InvoiceStatus::Created.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?;

            created.push(Invoice::try_from(row)?);
        }

        tx.commit().await.map_err(store_err)?;
        Ok(created)
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE invoices SET \
                 amount = $2, due_date = $3, status = $4, document = $5, updated_at = $6 \
             WHERE id = $1",
        )
        .bind(invoice.id.value())
        .bind(invoice.amount.value())
        .bind(invoice.due_date)
        .bind(invoice.status.as_str())
        .bind(invoice.document.as_deref())
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Invoice", invoice.id));
        }
        Ok(())
    }
}
