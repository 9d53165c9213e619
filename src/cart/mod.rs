//! The `Cart` aggregate: commands, events, storage and the read-model
//! projection derived from it (spec.md §3 MODULE `cart`).

mod aggregate;
mod errors;
mod events;
mod event_store;
mod ids;
mod projection;

pub use aggregate::{Cart, CartItem, CartStatus};
pub use errors::CartError;
pub use events::CartEvent;
pub use event_store::CartEventStore;
pub use ids::CartId;
pub use projection::{CartProjection, CartProjectionItem, CartProjector};
