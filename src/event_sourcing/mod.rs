//! Generic event-sourcing primitives shared by the `cart` and `product`
//! aggregates: the envelope every stored event is wrapped in, and the error
//! taxonomy an event store reports (spec.md §3.1, §4.2).

mod error;

pub use error::{EventStoreError, map_insert_error};

use jiff::Timestamp;
use serde::{Serialize, de::DeserializeOwned};

/// A fact about a past state change. Immutable once constructed (spec.md §3.1).
#[derive(Debug, Clone)]
pub struct EventEnvelope<E> {
    pub event_id: uuid::Uuid,
    pub aggregate_version: i64,
    pub occurred_at: Timestamp,
    pub payload: E,
}

/// Implemented by an aggregate's event enum so the generic replay/append
/// machinery can tag and route events without reflection.
pub trait DomainEvent: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The discriminator stored in the `event_type` column (spec.md §3.5).
    fn event_type(&self) -> &'static str;
}
