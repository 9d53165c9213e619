//! Product event types (spec.md §3.2).

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartId;
use crate::event_sourcing::DomainEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum ProductEvent {
    ProductCreated {
        name: String,
        price: Decimal,
        initial_stock: u32,
        description: String,
    },
    ProductStockReserved {
        cart_id: CartId,
        quantity: u32,
        reserved_until: Timestamp,
    },
    ProductStockReservationReleased {
        cart_id: CartId,
        quantity: u32,
        reason: String,
    },
    ProductStockIncreased {
        quantity: u32,
    },
    ProductStockDecreased {
        quantity: u32,
        order_id: uuid::Uuid,
    },
    ProductPriceChanged {
        old_price: Decimal,
        new_price: Decimal,
    },
    ProductUpdated {
        name: Option<String>,
        description: Option<String>,
    },
}

impl DomainEvent for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated { .. } => "ProductCreated",
            ProductEvent::ProductStockReserved { .. } => "ProductStockReserved",
            ProductEvent::ProductStockReservationReleased { .. } => "ProductStockReservationReleased",
            ProductEvent::ProductStockIncreased { .. } => "ProductStockIncreased",
            ProductEvent::ProductStockDecreased { .. } => "ProductStockDecreased",
            ProductEvent::ProductPriceChanged { .. } => "ProductPriceChanged",
            ProductEvent::ProductUpdated { .. } => "ProductUpdated",
        }
    }
}
