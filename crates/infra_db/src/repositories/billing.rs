//! Billing repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use core_kernel::{Amount, BillingId};
use domain_billing::{Billing, BillingStore, BillingType, NewBilling, StoreError};

use crate::error::store_err;
use crate::repositories::corrupt_row;

/// PostgreSQL-backed [`BillingStore`]
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    /// Creates a repository over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BillingRow {
    id: i64,
    year: i32,
    description: String,
    total_amount: Decimal,
    extra_charge: Option<Decimal>,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    billing_type: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<BillingRow> for Billing {
    type Error = StoreError;

    fn try_from(row: BillingRow) -> Result<Self, Self::Error> {
        let billing_type: BillingType = row
            .billing_type
            .parse()
            .map_err(|_| corrupt_row(format!("unknown billing type '{}'", row.billing_type)))?;

        Ok(Billing {
            id: BillingId::new(row.id),
            year: row.year,
            description: row.description,
            total_amount: Amount::new(row.total_amount),
            extra_charge: row.extra_charge.map(Amount::new),
            issue_date: row.issue_date,
            due_date: row.due_date,
            billing_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, year, description, total_amount, extra_charge, \
     issue_date, due_date, billing_type, created_at, updated_at";

#[async_trait]
impl BillingStore for BillingRepository {
    async fn find(&self, id: BillingId) -> Result<Option<Billing>, StoreError> {
        let row: Option<BillingRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM billings WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(Billing::try_from).transpose()
    }

    async fn list_by_year(&self, year: i32) -> Result<Vec<Billing>, StoreError> {
        let rows: Vec<BillingRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM billings WHERE year = $1 ORDER BY id"
        ))
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(Billing::try_from).collect()
    }

    async fn insert(&self, billing: NewBilling) -> Result<Billing, StoreError> {
        let row: BillingRow = sqlx::query_as(&format!(
            "INSERT INTO billings \
                 (year, description, total_amount, extra_charge, issue_date, due_date, billing_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(billing.year)
        .bind(&billing.description)
        .bind(billing.total_amount.value())
        .bind(billing.extra_charge.map(|a| a.value()))
        .bind(billing.issue_date)
        .bind(billing.due_date)
        .bind(billing.billing_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Billing::try_from(row)
    }

    async fn update(&self, billing: &Billing) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE billings SET \
                 year = $2, description = $3, total_amount = $4, extra_charge = $5, \
                 issue_date = $6, due_date = $7, billing_type = $8, updated_at = $9 \
             WHERE id = $1",
        )
        .bind(billing.id.value())
        .bind(billing.year)
        .bind(&billing.description)
        .bind(billing.total_amount.value())
        .bind(billing.extra_charge.map(|a| a.value()))
        .bind(billing.issue_date)
        .bind(billing.due_date)
        .bind(billing.billing_type.as_str())
        .bind(billing.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Billing", billing.id));
        }
        Ok(())
    }

    async fn delete(&self, id: BillingId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM billings WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Billing", id));
        }
        Ok(())
    }
}
