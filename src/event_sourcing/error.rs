use sqlx::postgres::PgDatabaseError;

/// Error taxonomy for an event store (spec.md §4.2, §7).
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    /// `expected_version` did not match the store's current version for this
    /// aggregate, or a concurrent inserter won the race on the unique
    /// `(aggregate_id, aggregate_version)` constraint.
    #[error("concurrency conflict: expected version {expected}, store is at {actual}")]
    ConcurrencyConflict { expected: i64, actual: i64 },

    /// An `event_type` tag in storage has no matching variant in the
    /// deployed binary. Fatal by design (spec.md §4.2): a missing event
    /// variant is a deploy-ordering bug, not a recoverable condition.
    #[error("unknown event type `{0}` while replaying aggregate")]
    UnknownEventType(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("failed to encode/decode event payload")]
    Serde(#[from] serde_json::Error),
}

/// Every concrete event store's `save` calls this after an insert fails, so
/// a unique-constraint violation on `(aggregate_id, aggregate_version)` is
/// indistinguishable from a conflict caught by the version pre-check
/// (spec.md §4.2: "translate the integrity violation into ConcurrencyConflict").
pub fn map_insert_error(err: sqlx::Error, expected: i64, constraint: &str) -> EventStoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err
            .downcast_ref::<PgDatabaseError>()
            .constraint()
            .is_some_and(|c| c == constraint)
        {
            return EventStoreError::ConcurrencyConflict {
                expected,
                actual: -1,
            };
        }
    }
    EventStoreError::Database(err)
}
