//! Postgres-backed append-only store for [`CartEvent`]s, with optimistic
//! concurrency enforced by the unique `(aggregate_id, aggregate_version)`
//! index on `cart_events` (spec.md §3.5, §4.2).

use jiff::Timestamp;
use jiff_sqlx::ToSqlx;
use sqlx::PgPool;
use sqlx::Row;

use crate::event_sourcing::{EventStoreError, map_insert_error};

use super::{Cart, CartEvent, CartId};

const CONCURRENCY_CONSTRAINT: &str = "idx_cart_aggregate_version";

#[derive(Clone)]
pub struct CartEventStore {
    pool: PgPool,
}

impl CartEventStore {
    pub fn new(pool: PgPool) -> Self {
        CartEventStore { pool }
    }

    /// Appends `events` for `cart_id`, each tagged with the version
    /// immediately following `expected_version`. A concurrent writer that won
    /// the race surfaces here as [`EventStoreError::ConcurrencyConflict`]
    /// (spec.md §4.2).
    pub async fn save(
        &self,
        cart_id: CartId,
        expected_version: i64,
        events: &[CartEvent],
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
                INSERT INTO cart_events
                    (event_id, aggregate_id, aggregate_version, event_type, event_data, occurred_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(uuid::Uuid::now_v7())
            .bind(cart_id.into_uuid())
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

    /// All events for `cart_id` in version order (spec.md §3.1 replay law).
    pub async fn get_events(&self, cart_id: CartId) -> Result<Vec<(Timestamp, CartEvent)>, EventStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT event_type, event_data, occurred_at
            FROM cart_events
            WHERE aggregate_id = $1
            ORDER BY aggregate_version ASC
            "#,
        )
        .bind(cart_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_type: String = row.try_get("event_type")?;
            let event_data: serde_json::Value = row.try_get("event_data")?;
            let occurred_at: jiff_sqlx::Timestamp = row.try_get("occurred_at")?;

            let event: CartEvent = serde_json::from_value(event_data).map_err(|err| {
                tracing::error!(%event_type, %err, "stored event_data does not match a known CartEvent variant");
                EventStoreError::UnknownEventType(event_type)
            })?;
            events.push((occurred_at.to_jiff(), event));
        }
        Ok(events)
    }

    /// Rebuilds the `Cart` aggregate by replaying its full event history, or
    /// `None` if no events exist for this id (spec.md §4.2).
    pub async fn load_aggregate(&self, cart_id: CartId) -> Result<Option<Cart>, EventStoreError> {
        let events = self.get_events(cart_id).await?;
        if events.is_empty() {
            return Ok(None);
        }

        let mut cart = Cart::new(cart_id);
        for (occurred_at, event) in events {
            cart.apply_stored(occurred_at, &event);
        }
        Ok(Some(cart))
    }
}
