//! Payment repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use core_kernel::{Amount, InvoiceId, PaymentId};
use domain_billing::{NewPayment, Payment, PaymentMethod, PaymentStore, StoreError};

use crate::error::store_err;
use crate::repositories::corrupt_row;

/// PostgreSQL-backed [`PaymentStore`]
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    /// Creates a repository over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    invoice_id: i64,
    amount: Decimal,
    payment_date: NaiveDate,
    method: String,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let method: PaymentMethod = row
            .method
            .parse()
            .map_err(|_| corrupt_row(format!("unknown payment method '{}'", row.method)))?;

        Ok(Payment {
            id: PaymentId::new(row.id),
            invoice_id: InvoiceId::new(row.invoice_id),
            amount: Amount::new(row.amount),
            payment_date: row.payment_date,
            method,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, invoice_id, amount, payment_date, method, comment, created_at";

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn find(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(Payment::try_from).transpose()
    }

    async fn list_by_invoice(&self, id: InvoiceId) -> Result<Vec<Payment>, StoreError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM payments WHERE invoice_id = $1 ORDER BY id"
        ))
        .bind(id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn list_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Payment>, StoreError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM payments \
             WHERE payment_date >= $1 AND payment_date <= $2 \
             ORDER BY payment_date, id"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn insert(&self, payment: NewPayment) -> Result<Payment, StoreError> {
        let row: PaymentRow = sqlx::query_as(&format!(
            "INSERT INTO payments (invoice_id, amount, payment_date, method, comment) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(payment.invoice_id.value())
        .bind(payment.amount.value())
        .bind(payment.payment_date)
        .bind(payment.method.as_str())
        .bind(&payment.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Payment::try_from(row)
    }

    async fn update(&self, payment: &Payment) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE payments SET amount = $2, payment_date = $3, method = $4, comment = $5 \
             WHERE id = $1",
        )
        .bind(payment.id.value())
        .bind(payment.amount.value())
        .bind(payment.payment_date)
        .bind(payment.method.as_str())
        .bind(&payment.comment)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Payment", payment.id));
        }
        Ok(())
    }

    async fn delete(&self, id: PaymentId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Payment", id));
        }
        Ok(())
    }
}
