//! Property repository
//!
//! Read-only: property records are maintained by the membership register,
//! the billing core only consumes them.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use core_kernel::{OwnerId, PropertyId, ShareRatio};
use domain_billing::{Property, PropertyStore, StoreError};

use crate::error::store_err;
use crate::repositories::corrupt_row;

/// PostgreSQL-backed [`PropertyStore`]
#[derive(Debug, Clone)]
pub struct PropertyRepository {
    pool: PgPool,
}

impl PropertyRepository {
    /// Creates a repository over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PropertyRow {
    id: i64,
    designation: String,
    share_ratio: Decimal,
    address: String,
    main_contact: Option<i64>,
}

impl TryFrom<PropertyRow> for Property {
    type Error = StoreError;

    fn try_from(row: PropertyRow) -> Result<Self, Self::Error> {
        let share_ratio = ShareRatio::new(row.share_ratio).map_err(|_| {
            corrupt_row(format!(
                "property {} has non-positive share {}",
                row.id, row.share_ratio
            ))
        })?;

        Ok(Property {
            id: PropertyId::new(row.id),
            designation: row.designation,
            share_ratio,
            address: row.address,
            main_contact: row.main_contact.map(OwnerId::new),
        })
    }
}

const SELECT_COLUMNS: &str = "id, designation, share_ratio, address, main_contact";

#[async_trait]
impl PropertyStore for PropertyRepository {
    async fn find(&self, id: PropertyId) -> Result<Option<Property>, StoreError> {
        let row: Option<PropertyRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM properties WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(Property::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Property>, StoreError> {
        let rows: Vec<PropertyRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM properties ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(Property::try_from).collect()
    }
}
