//! `Product` aggregate root: tracks total stock plus a set of per-cart
//! reservations with a TTL (spec.md §3.1, §3.3).
//!
//! The Rust translation keeps [`Product::reserved_stock`] and
//! [`Product::available_stock`] pure functions of `now` — they report what
//! is expired rather than mutating state to sweep it, the way a getter
//! never should. The actual sweep (turning expired reservations into
//! `ProductStockReservationReleased` events) happens only inside
//! `reserve_stock`, the one command that needs it.

use std::collections::HashMap;

use jiff::{Timestamp, ToSpan};
use rust_decimal::Decimal;

use crate::cart::CartId;

use super::{ProductError, ProductEvent, ProductId};

#[derive(Debug, Clone, Copy)]
pub struct Reservation {
    pub cart_id: CartId,
    pub quantity: u32,
    pub reserved_until: Timestamp,
}

impl Reservation {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.reserved_until
    }
}

#[derive(Debug, Clone)]
pub struct Product {
    pub product_id: ProductId,
    pub name: Option<String>,
    pub price: Decimal,
    pub description: String,
    pub total_stock: u32,
    pub reservations: HashMap<CartId, Reservation>,
    pub version: i64,
    pub created_at: Option<Timestamp>,
    uncommitted_events: Vec<ProductEvent>,
}

impl Product {
    pub fn new(product_id: ProductId) -> Self {
        Product {
            product_id,
            name: None,
            price: Decimal::ZERO,
            description: String::new(),
            total_stock: 0,
            reservations: HashMap::new(),
            version: 0,
            created_at: None,
            uncommitted_events: Vec::new(),
        }
    }

    pub fn replay(product_id: ProductId, events: impl IntoIterator<Item = ProductEvent>) -> Self {
        let mut product = Product::new(product_id);
        for event in events {
            product.apply(event);
        }
        product
    }

    pub fn uncommitted_events(&self) -> &[ProductEvent] {
        &self.uncommitted_events
    }

    pub fn take_uncommitted_events(&mut self) -> Vec<ProductEvent> {
        std::mem::take(&mut self.uncommitted_events)
    }

    fn apply(&mut self, event: ProductEvent) {
        self.mutate(&event);
        self.uncommitted_events.push(event);
    }

    fn mutate(&mut self, event: &ProductEvent) {
        self.version += 1;
        match event {
            ProductEvent::ProductCreated {
                name,
                price,
                initial_stock,
                description,
            } => {
                self.name = Some(name.clone());
                self.price = *price;
                self.total_stock = *initial_stock;
                self.description = description.clone();
            }
            ProductEvent::ProductStockReserved {
                cart_id,
                quantity,
                reserved_until,
            } => {
                self.reservations.insert(
                    *cart_id,
                    Reservation {
                        cart_id: *cart_id,
                        quantity: *quantity,
                        reserved_until: *reserved_until,
                    },
                );
            }
            ProductEvent::ProductStockReservationReleased { cart_id, .. } => {
                self.reservations.remove(cart_id);
            }
            ProductEvent::ProductStockIncreased { quantity } => {
                self.total_stock += quantity;
            }
            ProductEvent::ProductStockDecreased { quantity, .. } => {
                self.total_stock = self.total_stock.saturating_sub(*quantity);
            }
            ProductEvent::ProductPriceChanged { new_price, .. } => {
                self.price = *new_price;
            }
            ProductEvent::ProductUpdated { name, description } => {
                if let Some(name) = name {
                    self.name = Some(name.clone());
                }
                if let Some(description) = description {
                    self.description = description.clone();
                }
            }
        }
    }

    pub fn apply_stored(&mut self, occurred_at: Timestamp, event: &ProductEvent) {
        self.mutate(event);
        if matches!(event, ProductEvent::ProductCreated { .. }) {
            self.created_at = Some(occurred_at);
        }
    }

    pub fn create(
        &mut self,
        name: String,
        price: Decimal,
        initial_stock: u32,
        description: String,
    ) -> Result<(), ProductError> {
        if self.name.is_some() {
            return Err(ProductError::AlreadyCreated);
        }
        if price < Decimal::ZERO {
            return Err(ProductError::NegativePrice);
        }

        let event = ProductEvent::ProductCreated {
            name,
            price,
            initial_stock,
            description,
        };
        self.apply(event);
        Ok(())
    }

    /// Reserves `quantity` units of stock for `cart_id`, first sweeping any
    /// reservations that have already expired so their stock counts as
    /// available again (spec.md §3.3).
    pub fn reserve_stock(
        &mut self,
        cart_id: CartId,
        quantity: u32,
        now: Timestamp,
        reservation_minutes: i64,
    ) -> Result<(), ProductError> {
        if quantity == 0 {
            return Err(ProductError::QuantityMustBePositive);
        }

        self.sweep_expired_reservations(now);

        let available = self.available_stock(now);
        if quantity > available {
            return Err(ProductError::InsufficientStock {
                requested: quantity,
                available,
            });
        }

        let reserved_until = now
            .checked_add(reservation_minutes.minutes())
            .unwrap_or(now);
        let event = ProductEvent::ProductStockReserved {
            cart_id,
            quantity,
            reserved_until,
        };
        self.apply(event);
        Ok(())
    }

    /// Releases a reservation. Idempotent: releasing a reservation that
    /// doesn't exist (already released, or never made) is a no-op rather
    /// than an error (spec.md §3.3, §8.5).
    pub fn release_reservation(&mut self, cart_id: CartId, reason: impl Into<String>) {
        let Some(reservation) = self.reservations.get(&cart_id) else {
            return;
        };
        let event = ProductEvent::ProductStockReservationReleased {
            cart_id,
            quantity: reservation.quantity,
            reason: reason.into(),
        };
        self.apply(event);
    }

    /// Completes a checkout: releases the reservation and permanently
    /// decreases total stock by the reserved quantity (spec.md §3.3).
    pub fn checkout_reservation(
        &mut self,
        cart_id: CartId,
        order_id: uuid::Uuid,
    ) -> Result<(), ProductError> {
        let reservation = self
            .reservations
            .get(&cart_id)
            .copied()
            .ok_or(ProductError::ReservationNotFound(cart_id))?;

        self.release_reservation(cart_id, "checkout");

        let event = ProductEvent::ProductStockDecreased {
            quantity: reservation.quantity,
            order_id,
        };
        self.apply(event);
        Ok(())
    }

    pub fn increase_stock(&mut self, quantity: u32) -> Result<(), ProductError> {
        if quantity == 0 {
            return Err(ProductError::QuantityMustBePositive);
        }
        let event = ProductEvent::ProductStockIncreased { quantity };
        self.apply(event);
        Ok(())
    }

    pub fn change_price(&mut self, new_price: Decimal) -> Result<(), ProductError> {
        if new_price < Decimal::ZERO {
            return Err(ProductError::NegativePrice);
        }
        if new_price == self.price {
            return Ok(());
        }
        let event = ProductEvent::ProductPriceChanged {
            old_price: self.price,
            new_price,
        };
        self.apply(event);
        Ok(())
    }

    pub fn update_details(&mut self, name: Option<String>, description: Option<String>) {
        if name.is_none() && description.is_none() {
            return;
        }
        let event = ProductEvent::ProductUpdated { name, description };
        self.apply(event);
    }

    /// Total stock still tied up in reservations that have not expired as of
    /// `now`.
    pub fn reserved_stock(&self, now: Timestamp) -> u32 {
        self.reservations
            .values()
            .filter(|r| !r.is_expired(now))
            .map(|r| r.quantity)
            .sum()
    }

    pub fn available_stock(&self, now: Timestamp) -> u32 {
        self.total_stock.saturating_sub(self.reserved_stock(now))
    }

    fn sweep_expired_reservations(&mut self, now: Timestamp) {
        let expired: Vec<CartId> = self
            .reservations
            .values()
            .filter(|r| r.is_expired(now))
            .map(|r| r.cart_id)
            .collect();
        for cart_id in expired {
            self.release_reservation(cart_id, "timeout");
        }
    }
}
