//! Single-aggregate cart use cases: load, apply a command, persist, project
//! (spec.md §4.4). Each wraps [`with_optimistic_retry`] around the full
//! load-command-save cycle, so a retry re-reads the aggregate's current
//! version rather than replaying a stale one.

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::cart::{Cart, CartError, CartEventStore, CartId, CartProjector, CartStatus};
use crate::event_sourcing::EventStoreError;
use crate::product::ProductId;

use super::retry::{RetryClassify, with_optimistic_retry};

#[derive(Debug, thiserror::Error)]
pub enum CartUseCaseError {
    #[error("cart {0} not found")]
    NotFound(CartId),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Store(#[from] EventStoreError),
}

impl RetryClassify for CartUseCaseError {
    fn is_concurrency_conflict(&self) -> bool {
        matches!(self, CartUseCaseError::Store(err) if err.is_concurrency_conflict())
    }
}

#[derive(Clone)]
pub struct CartUseCases {
    event_store: CartEventStore,
    projector: CartProjector,
    max_retries: usize,
}

impl CartUseCases {
    pub fn new(event_store: CartEventStore, projector: CartProjector, max_retries: usize) -> Self {
        CartUseCases {
            event_store,
            projector,
            max_retries,
        }
    }

    pub async fn create_cart(&self, user_id: String) -> Result<CartId, CartUseCaseError> {
        let cart_id = CartId::new();
        let mut cart = Cart::new(cart_id);
        cart.create(user_id);
        self.save(&mut cart).await?;
        Ok(cart_id)
    }

    /// Adds an item directly to the cart aggregate without touching product
    /// stock. The coordinator composes this with a product reservation
    /// (spec.md §4.5); call it directly only when stock tracking doesn't
    /// apply.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        product_name: String,
        price: Decimal,
        quantity: u32,
    ) -> Result<(), CartUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let mut cart = self.load(cart_id).await?.ok_or(CartUseCaseError::NotFound(cart_id))?;
            cart.add_item(product_id.clone(), product_name.clone(), price, quantity)?;
            self.save(&mut cart).await
        })
        .await
    }

    pub async fn remove_item(&self, cart_id: CartId, product_id: ProductId) -> Result<(), CartUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let mut cart = self.load(cart_id).await?.ok_or(CartUseCaseError::NotFound(cart_id))?;
            cart.remove_item(&product_id)?;
            self.save(&mut cart).await
        })
        .await
    }

    pub async fn change_quantity(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        new_quantity: u32,
    ) -> Result<(), CartUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let mut cart = self.load(cart_id).await?.ok_or(CartUseCaseError::NotFound(cart_id))?;
            cart.change_quantity(&product_id, new_quantity)?;
            self.save(&mut cart).await
        })
        .await
    }

    /// Checks out the cart aggregate only — product reservation completion
    /// is the coordinator's job (spec.md §4.5).
    pub async fn checkout(&self, cart_id: CartId, order_id: uuid::Uuid) -> Result<Cart, CartUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let mut cart = self.load(cart_id).await?.ok_or(CartUseCaseError::NotFound(cart_id))?;
            cart.checkout(order_id)?;
            self.save(&mut cart).await?;
            Ok(cart.clone())
        })
        .await
    }

    /// Returns `Ok(None)` rather than an error when the cart is missing or
    /// already past `PENDING` — expiring a cart that's already resolved is
    /// not a failure (spec.md §4.6, mirrors the scheduler's idempotent tick).
    pub async fn expire(&self, cart_id: CartId, reason: String) -> Result<Option<Cart>, CartUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let Some(mut cart) = self.load(cart_id).await? else {
                return Ok(None);
            };
            if cart.status != CartStatus::Pending {
                return Ok(None);
            }
            cart.expire(reason.clone())?;
            self.save(&mut cart).await?;
            Ok(Some(cart.clone()))
        })
        .await
    }

    async fn load(&self, cart_id: CartId) -> Result<Option<Cart>, CartUseCaseError> {
        Ok(self.event_store.load_aggregate(cart_id).await?)
    }

    async fn save(&self, cart: &mut Cart) -> Result<(), CartUseCaseError> {
        let uncommitted = cart.take_uncommitted_events();
        let expected_version = cart.version - uncommitted.len() as i64;
        self.event_store.save(cart.cart_id, expected_version, &uncommitted).await?;
        self.projector.project(cart, Timestamp::now()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_use_case_error_wraps_cart_error() {
        let err = CartUseCaseError::Cart(CartError::EmptyCart);
        assert!(matches!(err, CartUseCaseError::Cart(CartError::EmptyCart)));
    }

    #[test]
    fn only_store_conflicts_are_retryable() {
        let conflict = CartUseCaseError::Store(EventStoreError::ConcurrencyConflict {
            expected: 1,
            actual: 2,
        });
        assert!(conflict.is_concurrency_conflict());

        let validation = CartUseCaseError::Cart(CartError::EmptyCart);
        assert!(!validation.is_concurrency_conflict());
    }
}
