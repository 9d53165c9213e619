//! `Cart` aggregate root: state is rebuilt by replaying [`CartEvent`]s, and
//! every state change is validated in a command method before the resulting
//! event is produced (spec.md §3.1, §3.3).

use std::collections::HashMap;

use jiff::{Timestamp, ToSpan};
use rust_decimal::Decimal;

use crate::product::ProductId;

use super::{CartError, CartEvent, CartId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    Pending,
    CheckedOut,
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    pub fn total_price(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct Cart {
    pub cart_id: CartId,
    pub user_id: Option<String>,
    pub items: HashMap<ProductId, CartItem>,
    pub status: CartStatus,
    pub version: i64,
    pub created_at: Option<Timestamp>,
    pub last_activity: Option<Timestamp>,
    uncommitted_events: Vec<CartEvent>,
}

impl Cart {
    /// A brand-new, unpersisted aggregate. `create` is the only command valid
    /// from this state (spec.md §3.3).
    pub fn new(cart_id: CartId) -> Self {
        Cart {
            cart_id,
            user_id: None,
            items: HashMap::new(),
            status: CartStatus::Pending,
            version: 0,
            created_at: None,
            last_activity: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Rebuilds a `Cart` by replaying its full event history in order
    /// (spec.md §3.1 replay law).
    pub fn replay(cart_id: CartId, events: impl IntoIterator<Item = CartEvent>) -> Self {
        let mut cart = Cart::new(cart_id);
        for event in events {
            cart.apply(event);
        }
        cart
    }

    pub fn uncommitted_events(&self) -> &[CartEvent] {
        &self.uncommitted_events
    }

    pub fn take_uncommitted_events(&mut self) -> Vec<CartEvent> {
        std::mem::take(&mut self.uncommitted_events)
    }

    /// Applies an already-decided event to in-memory state and records it as
    /// uncommitted, ready for the event store to persist (spec.md §3.1).
    /// Stamps `last_activity` (and `created_at`, for the first event) with
    /// the current wall clock, since a live event's `occurred_at` is "now";
    /// mirrors what `apply_stored` does with the timestamp read back from
    /// storage during replay.
    fn apply(&mut self, event: CartEvent) {
        self.mutate(&event);
        let now = Timestamp::now();
        self.last_activity = Some(now);
        if matches!(event, CartEvent::CartCreated { .. }) {
            self.created_at = Some(now);
        }
        self.uncommitted_events.push(event);
    }

    /// Applies an event read back from storage: mutates state but does not
    /// mark it uncommitted, since it is already durable (spec.md §4.2).
    fn mutate(&mut self, event: &CartEvent) {
        self.version += 1;
        match event {
            CartEvent::CartCreated { user_id, .. } => {
                self.user_id = Some(user_id.clone());
                self.status = CartStatus::Pending;
            }
            CartEvent::ItemAddedToCart {
                product_id,
                product_name,
                price,
                quantity,
            } => {
                self.items
                    .entry(product_id.clone())
                    .and_modify(|item| item.quantity += quantity)
                    .or_insert_with(|| CartItem {
                        product_id: product_id.clone(),
                        product_name: product_name.clone(),
                        price: *price,
                        quantity: *quantity,
                    });
            }
            CartEvent::ItemRemovedFromCart { product_id } => {
                self.items.remove(product_id);
            }
            CartEvent::ItemQuantityChanged {
                product_id,
                new_quantity,
                ..
            } => {
                if let Some(item) = self.items.get_mut(product_id) {
                    item.quantity = *new_quantity;
                }
            }
            CartEvent::CartCheckedOut { .. } => {
                self.status = CartStatus::CheckedOut;
            }
            CartEvent::CartExpired { .. } => {
                self.status = CartStatus::Expired;
            }
        }
    }

    /// Replays a single event that arrived from storage, recording its
    /// `occurred_at` as the new `last_activity`/`created_at`. Event stores
    /// call this directly rather than going through `apply`.
    pub fn apply_stored(&mut self, occurred_at: Timestamp, event: &CartEvent) {
        self.mutate(event);
        self.last_activity = Some(occurred_at);
        if matches!(event, CartEvent::CartCreated { .. }) {
            self.created_at = Some(occurred_at);
        }
    }

    pub fn create(&mut self, user_id: String) {
        let event = CartEvent::CartCreated {
            cart_id: self.cart_id,
            user_id,
        };
        self.apply(event);
    }

    pub fn add_item(
        &mut self,
        product_id: ProductId,
        product_name: String,
        price: Decimal,
        quantity: u32,
    ) -> Result<(), CartError> {
        if self.status != CartStatus::Pending {
            return Err(CartError::NotPending);
        }
        if quantity == 0 {
            return Err(CartError::QuantityMustBePositive);
        }
        if price < Decimal::ZERO {
            return Err(CartError::NegativePrice);
        }

        let event = CartEvent::ItemAddedToCart {
            product_id,
            product_name,
            price,
            quantity,
        };
        self.apply(event);
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &ProductId) -> Result<(), CartError> {
        if self.status != CartStatus::Pending {
            return Err(CartError::NotPending);
        }
        if !self.items.contains_key(product_id) {
            return Err(CartError::ProductNotInCart(product_id.clone()));
        }

        let event = CartEvent::ItemRemovedFromCart {
            product_id: product_id.clone(),
        };
        self.apply(event);
        Ok(())
    }

    pub fn change_quantity(
        &mut self,
        product_id: &ProductId,
        new_quantity: u32,
    ) -> Result<(), CartError> {
        if self.status != CartStatus::Pending {
            return Err(CartError::NotPending);
        }
        let item = self
            .items
            .get(product_id)
            .ok_or_else(|| CartError::ProductNotInCart(product_id.clone()))?;
        if new_quantity == 0 {
            return Err(CartError::QuantityMustBePositive);
        }

        let event = CartEvent::ItemQuantityChanged {
            product_id: product_id.clone(),
            old_quantity: item.quantity,
            new_quantity,
        };
        self.apply(event);
        Ok(())
    }

    pub fn checkout(&mut self, order_id: uuid::Uuid) -> Result<Decimal, CartError> {
        if self.status != CartStatus::Pending {
            return Err(CartError::NotPending);
        }
        if self.items.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let total_amount = self.total_amount();
        let event = CartEvent::CartCheckedOut {
            order_id,
            total_amount,
        };
        self.apply(event);
        Ok(total_amount)
    }

    pub fn expire(&mut self, reason: impl Into<String>) -> Result<(), CartError> {
        if self.status != CartStatus::Pending {
            return Err(CartError::NotPending);
        }

        let event = CartEvent::CartExpired {
            reason: reason.into(),
        };
        self.apply(event);
        Ok(())
    }

    pub fn total_amount(&self) -> Decimal {
        self.items.values().map(CartItem::total_price).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.items.values().map(|item| item.quantity).sum()
    }

    /// True once `last_activity` is further in the past than `timeout_minutes`
    /// (spec.md §3.3, §4.6). Only ever true for a `PENDING` cart.
    pub fn is_expired(&self, now: Timestamp, timeout_minutes: i64) -> bool {
        if self.status != CartStatus::Pending {
            return false;
        }
        let Some(last_activity) = self.last_activity else {
            return false;
        };
        let threshold = now.checked_sub(timeout_minutes.minutes()).unwrap_or(now);
        last_activity < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(id: &str) -> (ProductId, String, Decimal, u32) {
        (
            ProductId::new(id),
            format!("Product {id}"),
            Decimal::new(1099, 2),
            2,
        )
    }

    #[test]
    fn create_then_add_item_accumulates_total() {
        let mut cart = Cart::new(CartId::new());
        cart.create("user-1".to_string());
        let (product_id, name, price, qty) = sample_item("SKU-1");
        cart.add_item(product_id, name, price, qty).unwrap();

        assert_eq!(cart.version, 2);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total_amount(), Decimal::new(2198, 2));
    }

    #[test]
    fn adding_same_product_twice_merges_quantity() {
        let mut cart = Cart::new(CartId::new());
        cart.create("user-1".to_string());
        let (product_id, name, price, _) = sample_item("SKU-1");
        cart.add_item(product_id.clone(), name.clone(), price, 2)
            .unwrap();
        cart.add_item(product_id, name, price, 3).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn add_item_rejects_zero_quantity() {
        let mut cart = Cart::new(CartId::new());
        cart.create("user-1".to_string());
        let (product_id, name, price, _) = sample_item("SKU-1");
        let err = cart.add_item(product_id, name, price, 0).unwrap_err();
        assert_eq!(err, CartError::QuantityMustBePositive);
    }

    #[test]
    fn checkout_requires_pending_and_nonempty() {
        let mut cart = Cart::new(CartId::new());
        cart.create("user-1".to_string());
        assert_eq!(
            cart.checkout(uuid::Uuid::now_v7()).unwrap_err(),
            CartError::EmptyCart
        );

        let (product_id, name, price, qty) = sample_item("SKU-1");
        cart.add_item(product_id, name, price, qty).unwrap();
        let total = cart.checkout(uuid::Uuid::now_v7()).unwrap();
        assert_eq!(total, Decimal::new(2198, 2));
        assert_eq!(cart.status, CartStatus::CheckedOut);

        assert_eq!(cart.checkout(uuid::Uuid::now_v7()).unwrap_err(), CartError::NotPending);
    }

    #[test]
    fn replay_reproduces_the_same_state_as_incremental_apply() {
        let mut live = Cart::new(CartId::new());
        live.create("user-1".to_string());
        let (product_id, name, price, qty) = sample_item("SKU-1");
        live.add_item(product_id.clone(), name, price, qty).unwrap();
        live.change_quantity(&product_id, 5).unwrap();

        let events = live.uncommitted_events().to_vec();
        let replayed = Cart::replay(live.cart_id, events);

        assert_eq!(replayed.version, live.version);
        assert_eq!(replayed.item_count(), live.item_count());
        assert_eq!(replayed.status, live.status);
    }
}
