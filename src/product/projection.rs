//! Denormalized read model for products (spec.md §3.4, §4.3).

use jiff::Timestamp;
use jiff_sqlx::ToSqlx;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

use crate::event_sourcing::EventStoreError;

use super::{Product, ProductId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductProjection {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub total_stock: i32,
    pub reserved_stock: i32,
    pub available_stock: i32,
    pub version: i64,
    pub created_at: Timestamp,
}

#[derive(Clone)]
pub struct ProductProjector {
    pool: PgPool,
}

impl ProductProjector {
    pub fn new(pool: PgPool) -> Self {
        ProductProjector { pool }
    }

    /// Upserts `product_read_model`, guarded the same way as
    /// [`crate::cart::CartProjector::project`]: a write older than the
    /// stored version is silently dropped.
    pub async fn project(&self, product: &Product, now: Timestamp) -> Result<(), EventStoreError> {
        let name = product.name.clone().unwrap_or_default();
        let created_at = product.created_at.unwrap_or(now);
        let reserved_stock = product.reserved_stock(now) as i32;
        let available_stock = product.available_stock(now) as i32;

        sqlx::query(
            r#"
            INSERT INTO product_read_model
                (product_id, name, price, description, total_stock, reserved_stock, available_stock, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (product_id) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                description = EXCLUDED.description,
                total_stock = EXCLUDED.total_stock,
                reserved_stock = EXCLUDED.reserved_stock,
                available_stock = EXCLUDED.available_stock,
                version = EXCLUDED.version,
                updated_at = EXCLUDED.updated_at
            WHERE product_read_model.version < EXCLUDED.version
            "#,
        )
        .bind(product.product_id.as_str())
        .bind(&name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.total_stock as i32)
        .bind(reserved_stock)
        .bind(available_stock)
        .bind(product.version)
        .bind(created_at.to_sqlx())
        .bind(now.to_sqlx())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, product_id: &ProductId) -> Result<Option<ProductProjection>, EventStoreError> {
        let row = sqlx::query(
            r#"
            SELECT product_id, name, price, description, total_stock, reserved_stock, available_stock, version, created_at
            FROM product_read_model
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_projection).transpose()
    }

    pub async fn list(&self) -> Result<Vec<ProductProjection>, EventStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, name, price, description, total_stock, reserved_stock, available_stock, version, created_at
            FROM product_read_model
            ORDER BY product_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_projection).collect()
    }
}

fn row_to_projection(row: sqlx::postgres::PgRow) -> Result<ProductProjection, EventStoreError> {
    let created_at: jiff_sqlx::Timestamp = row.try_get("created_at")?;
    Ok(ProductProjection {
        product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
        total_stock: row.try_get("total_stock")?,
        reserved_stock: row.try_get("reserved_stock")?,
        available_stock: row.try_get("available_stock")?,
        version: row.try_get::<i64, _>("version")?,
        created_at: created_at.to_jiff(),
    })
}
