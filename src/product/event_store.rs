//! Postgres-backed append-only store for [`ProductEvent`]s. Mirrors
//! [`crate::cart::CartEventStore`] but keys on the string `ProductId`
//! (spec.md §3.5, §4.2).

use jiff::Timestamp;
use jiff_sqlx::ToSqlx;
use sqlx::PgPool;
use sqlx::Row;

use crate::event_sourcing::{EventStoreError, map_insert_error};

use super::{Product, ProductEvent, ProductId};

const CONCURRENCY_CONSTRAINT: &str = "idx_product_aggregate_version";

#[derive(Clone)]
pub struct ProductEventStore {
    pool: PgPool,
}

impl ProductEventStore {
    pub fn new(pool: PgPool) -> Self {
        ProductEventStore { pool }
    }

    pub async fn save(
        &self,
        product_id: &ProductId,
        expected_version: i64,
        events: &[ProductEvent],
    ) -> Result<(), EventStoreError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        let now = Timestamp::now();

        for (offset, event) in events.iter().enumerate() {
            let version = expected_version + offset as i64 + 1;
            let event_data = serde_json::to_value(event)?;

            let result = sqlx::query(
                r#"
                INSERT INTO product_events
                    (event_id, aggregate_id, aggregate_version, event_type, event_data, occurred_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(uuid::Uuid::now_v7())
            .bind(product_id.as_str())
            .bind(version)
            .bind(event.event_type())
            .bind(sqlx::types::Json(&event_data))
            .bind(now.to_sqlx())
            .execute(&mut *tx)
            .await;

            if let Err(err) = result {
                return Err(map_insert_error(err, expected_version, CONCURRENCY_CONSTRAINT));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_events(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<(Timestamp, ProductEvent)>, EventStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT event_type, event_data, occurred_at
            FROM product_events
            WHERE aggregate_id = $1
            ORDER BY aggregate_version ASC
            "#,
        )
        .bind(product_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_type: String = row.try_get("event_type")?;
            let event_data: serde_json::Value = row.try_get("event_data")?;
            let occurred_at: jiff_sqlx::Timestamp = row.try_get("occurred_at")?;

            let event: ProductEvent = serde_json::from_value(event_data).map_err(|err| {
                tracing::error!(%event_type, %err, "stored event_data does not match a known ProductEvent variant");
                EventStoreError::UnknownEventType(event_type)
            })?;
            events.push((occurred_at.to_jiff(), event));
        }
        Ok(events)
    }

    pub async fn load_aggregate(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<Product>, EventStoreError> {
        let events = self.get_events(product_id).await?;
        if events.is_empty() {
            return Ok(None);
        }

        let mut product = Product::new(product_id.clone());
        for (occurred_at, event) in events {
            product.apply_stored(occurred_at, &event);
        }
        Ok(Some(product))
    }
}
