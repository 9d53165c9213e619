//! Single-aggregate product use cases: load, apply a command, persist,
//! project (spec.md §4.4).

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::cart::CartId;
use crate::event_sourcing::EventStoreError;
use crate::product::{Product, ProductError, ProductEventStore, ProductId, ProductProjector};

use super::retry::{RetryClassify, with_optimistic_retry};

#[derive(Debug, thiserror::Error)]
pub enum ProductUseCaseError {
    #[error("product {0} not found")]
    NotFound(ProductId),

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Store(#[from] EventStoreError),
}

impl RetryClassify for ProductUseCaseError {
    fn is_concurrency_conflict(&self) -> bool {
        matches!(self, ProductUseCaseError::Store(err) if err.is_concurrency_conflict())
    }
}

#[derive(Clone)]
pub struct ProductUseCases {
    event_store: ProductEventStore,
    projector: ProductProjector,
    max_retries: usize,
    reservation_minutes: i64,
}

impl ProductUseCases {
    pub fn new(
        event_store: ProductEventStore,
        projector: ProductProjector,
        max_retries: usize,
        reservation_minutes: i64,
    ) -> Self {
        ProductUseCases {
            event_store,
            projector,
            max_retries,
            reservation_minutes,
        }
    }

    pub async fn create_product(
        &self,
        product_id: ProductId,
        name: String,
        price: Decimal,
        initial_stock: u32,
        description: String,
    ) -> Result<(), ProductUseCaseError> {
        let mut product = Product::new(product_id);
        product.create(name, price, initial_stock, description)?;
        self.save(&mut product).await
    }

    /// Reserves stock for `cart_id`. The coordinator calls this before
    /// adding the item to the cart aggregate, and compensates with
    /// [`Self::release_reservation`] if the cart side then fails
    /// (spec.md §4.5).
    pub async fn reserve_stock(
        &self,
        product_id: &ProductId,
        cart_id: CartId,
        quantity: u32,
    ) -> Result<(), ProductUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let mut product = self.load(product_id).await?;
            product.reserve_stock(cart_id, quantity, Timestamp::now(), self.reservation_minutes)?;
            self.save(&mut product).await
        })
        .await
    }

    /// Idempotent: releasing a reservation that no longer exists succeeds
    /// silently, since [`Product::release_reservation`] is itself a no-op in
    /// that case (spec.md §8.5).
    pub async fn release_reservation(
        &self,
        product_id: &ProductId,
        cart_id: CartId,
        reason: String,
    ) -> Result<(), ProductUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let mut product = self.load(product_id).await?;
            product.release_reservation(cart_id, reason.clone());
            self.save(&mut product).await
        })
        .await
    }

    pub async fn checkout_reservation(
        &self,
        product_id: &ProductId,
        cart_id: CartId,
        order_id: uuid::Uuid,
    ) -> Result<(), ProductUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let mut product = self.load(product_id).await?;
            product.checkout_reservation(cart_id, order_id)?;
            self.save(&mut product).await
        })
        .await
    }

    pub async fn increase_stock(&self, product_id: &ProductId, quantity: u32) -> Result<(), ProductUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let mut product = self.load(product_id).await?;
            product.increase_stock(quantity)?;
            self.save(&mut product).await
        })
        .await
    }

    pub async fn change_price(&self, product_id: &ProductId, new_price: Decimal) -> Result<(), ProductUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let mut product = self.load(product_id).await?;
            product.change_price(new_price)?;
            self.save(&mut product).await
        })
        .await
    }

    pub async fn update_product(
        &self,
        product_id: &ProductId,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<(), ProductUseCaseError> {
        with_optimistic_retry(self.max_retries, || async {
            let mut product = self.load(product_id).await?;
            product.update_details(name.clone(), description.clone());
            self.save(&mut product).await
        })
        .await
    }

    async fn load(&self, product_id: &ProductId) -> Result<Product, ProductUseCaseError> {
        self.event_store
            .load_aggregate(product_id)
            .await?
            .ok_or_else(|| ProductUseCaseError::NotFound(product_id.clone()))
    }

    async fn save(&self, product: &mut Product) -> Result<(), ProductUseCaseError> {
        let uncommitted = product.take_uncommitted_events();
        let expected_version = product.version - uncommitted.len() as i64;
        self.event_store
            .save(&product.product_id, expected_version, &uncommitted)
            .await?;
        self.projector.project(product, Timestamp::now()).await?;
        Ok(())
    }
}
