//! Cart event types (spec.md §3.2).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::event_sourcing::DomainEvent;
use crate::product::ProductId;

use super::CartId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum CartEvent {
    CartCreated {
        cart_id: CartId,
        user_id: String,
    },
    ItemAddedToCart {
        product_id: ProductId,
        product_name: String,
        price: Decimal,
        quantity: u32,
    },
    ItemRemovedFromCart {
        product_id: ProductId,
    },
    ItemQuantityChanged {
        product_id: ProductId,
        old_quantity: u32,
        new_quantity: u32,
    },
    CartCheckedOut {
        order_id: uuid::Uuid,
        total_amount: Decimal,
    },
    CartExpired {
        reason: String,
    },
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::CartCreated { .. } => "CartCreated",
            CartEvent::ItemAddedToCart { .. } => "ItemAddedToCart",
            CartEvent::ItemRemovedFromCart { .. } => "ItemRemovedFromCart",
            CartEvent::ItemQuantityChanged { .. } => "ItemQuantityChanged",
            CartEvent::CartCheckedOut { .. } => "CartCheckedOut",
            CartEvent::CartExpired { .. } => "CartExpired",
        }
    }
}
