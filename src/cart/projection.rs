//! Denormalized read model for carts, updated after each event batch is
//! persisted (spec.md §3.4, §4.3).

use jiff::Timestamp;
use jiff_sqlx::ToSqlx;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

use crate::event_sourcing::EventStoreError;

use super::{Cart, CartId, CartStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartProjectionItem {
    pub product_id: String,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartProjection {
    pub cart_id: CartId,
    pub user_id: String,
    pub status: String,
    pub items: Vec<CartProjectionItem>,
    pub total_amount: Decimal,
    pub item_count: i32,
    pub version: i64,
    pub created_at: Timestamp,
    pub last_activity: Timestamp,
}

fn status_label(status: CartStatus) -> &'static str {
    match status {
        CartStatus::Pending => "PENDING",
        CartStatus::CheckedOut => "CHECKED_OUT",
        CartStatus::Expired => "EXPIRED",
    }
}

#[derive(Clone)]
pub struct CartProjector {
    pool: PgPool,
}

impl CartProjector {
    pub fn new(pool: PgPool) -> Self {
        CartProjector { pool }
    }

    /// Upserts `cart_read_model` from the aggregate's current state. `now`
    /// is the save-time timestamp (mirrors
    /// [`crate::product::ProductProjector::project`]); it backstops
    /// `last_activity`/`created_at` for an aggregate that hasn't set them
    /// yet and is always used for `updated_at`, which must reflect this
    /// write rather than copy another column. Skips the write if a newer
    /// version is already stored, so projections are safe to re-run out of
    /// order (spec.md §4.3 non-regression guard).
    pub async fn project(&self, cart: &Cart, now: Timestamp) -> Result<(), EventStoreError> {
        let items: Vec<CartProjectionItem> = cart
            .items
            .values()
            .map(|item| CartProjectionItem {
                product_id: item.product_id.as_str().to_string(),
                product_name: item.product_name.clone(),
                price: item.price,
                quantity: item.quantity,
            })
            .collect();
        let items_json = serde_json::to_value(&items)?;
        let last_activity = cart.last_activity.unwrap_or(now);
        let created_at = cart.created_at.unwrap_or(now);

        sqlx::query(
            r#"
            INSERT INTO cart_read_model
                (cart_id, user_id, status, items, total_amount, item_count, version, created_at, last_activity, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (cart_id) DO UPDATE SET
                status = EXCLUDED.status,
                items = EXCLUDED.items,
                total_amount = EXCLUDED.total_amount,
                item_count = EXCLUDED.item_count,
                version = EXCLUDED.version,
                last_activity = EXCLUDED.last_activity,
                updated_at = EXCLUDED.updated_at
            WHERE cart_read_model.version < EXCLUDED.version
            "#,
        )
        .bind(cart.cart_id.into_uuid())
        .bind(cart.user_id.clone().unwrap_or_default())
        .bind(status_label(cart.status))
        .bind(sqlx::types::Json(items_json))
        .bind(cart.total_amount())
        .bind(cart.item_count() as i32)
        .bind(cart.version)
        .bind(created_at.to_sqlx())
        .bind(last_activity.to_sqlx())
        .bind(now.to_sqlx())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, cart_id: CartId) -> Result<Option<CartProjection>, EventStoreError> {
        let row = sqlx::query(
            r#"
            SELECT cart_id, user_id, status, items, total_amount, item_count, version, created_at, last_activity
            FROM cart_read_model
            WHERE cart_id = $1
            "#,
        )
        .bind(cart_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_projection).transpose()
    }

    pub async fn get_user_carts(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<CartProjection>, EventStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT cart_id, user_id, status, items, total_amount, item_count, version, created_at, last_activity
            FROM cart_read_model
            WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY last_activity DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_projection).collect()
    }

    /// Ids of `PENDING` carts whose `last_activity` is older than
    /// `timeout_minutes` (spec.md §4.6 expiration scheduler query).
    pub async fn get_expired_cart_ids(&self, timeout_minutes: i64) -> Result<Vec<CartId>, EventStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT cart_id
            FROM cart_read_model
            WHERE status = 'PENDING'
              AND last_activity < now() - make_interval(mins => $1)
            "#,
        )
        .bind(timeout_minutes as i32)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CartId::from(row.get::<uuid::Uuid, _>("cart_id")))
            .collect())
    }
}

fn row_to_projection(row: sqlx::postgres::PgRow) -> Result<CartProjection, EventStoreError> {
    let items_json: serde_json::Value = row.try_get("items")?;
    let items: Vec<CartProjectionItem> = serde_json::from_value(items_json)?;
    let created_at: jiff_sqlx::Timestamp = row.try_get("created_at")?;
    let last_activity: jiff_sqlx::Timestamp = row.try_get("last_activity")?;

    Ok(CartProjection {
        cart_id: CartId::from(row.try_get::<uuid::Uuid, _>("cart_id")?),
        user_id: row.try_get("user_id")?,
        status: row.try_get("status")?,
        items,
        total_amount: row.try_get("total_amount")?,
        item_count: row.try_get("item_count")?,
        version: row.try_get::<i64, _>("version")?,
        created_at: created_at.to_jiff(),
        last_activity: last_activity.to_jiff(),
    })
}
