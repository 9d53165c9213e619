//! Grounded on `CartExpirationBackgroundTask`/`ExpireCartUseCase`: every
//! tick, find `PENDING` carts idle past the timeout, expire each one, and
//! release its product reservations. A failure on one cart is logged and
//! does not stop the tick from reaching the rest (spec.md §4.6).

use std::time::Duration;

use async_trait::async_trait;
use tokio::select;
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemHandle};
use tracing::{error, info, warn};

use crate::cart::CartProjector;
use crate::use_cases::{CartUseCases, ProductUseCases};

#[derive(Clone)]
pub struct ExpirationScheduler {
    cart_projector: CartProjector,
    cart_use_cases: CartUseCases,
    product_use_cases: ProductUseCases,
    interval: Duration,
    timeout_minutes: i64,
}

impl ExpirationScheduler {
    pub fn new(
        cart_projector: CartProjector,
        cart_use_cases: CartUseCases,
        product_use_cases: ProductUseCases,
        interval: Duration,
        timeout_minutes: i64,
    ) -> Self {
        ExpirationScheduler {
            cart_projector,
            cart_use_cases,
            product_use_cases,
            interval,
            timeout_minutes,
        }
    }

    /// Runs a single tick outside the interval loop, so integration tests
    /// can drive expiration deterministically instead of waiting out the
    /// real `interval` (spec.md §4.6).
    pub async fn run_once(&self) {
        self.tick().await;
    }

    async fn tick(&self) {
        let expired_ids = match self.cart_projector.get_expired_cart_ids(self.timeout_minutes).await {
            Ok(ids) => ids,
            Err(err) => {
                error!(%err, "failed to query expired carts");
                return;
            }
        };

        if expired_ids.is_empty() {
            return;
        }

        info!(count = expired_ids.len(), "expiring inactive carts");

        for cart_id in expired_ids {
            let reason = format!("{}_minute_timeout", self.timeout_minutes);
            let cart = match self.cart_use_cases.expire(cart_id, reason).await {
                Ok(Some(cart)) => cart,
                Ok(None) => continue,
                Err(err) => {
                    warn!(%cart_id, %err, "failed to expire cart");
                    continue;
                }
            };

            for product_id in cart.items.keys() {
                if let Err(err) = self
                    .product_use_cases
                    .release_reservation(product_id, cart_id, "cart_expired".to_string())
                    .await
                {
                    warn!(%cart_id, %product_id, %err, "failed to release reservation for expired cart");
                }
            }
        }
    }

    async fn run_loop(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }
}

#[async_trait]
impl IntoSubsystem<anyhow::Error> for ExpirationScheduler {
    async fn run(self, subsys: SubsystemHandle) -> Result<(), anyhow::Error> {
        info!("Cart expiration scheduler starting.");
        select!(
            _ = self.run_loop() => {
                error!("Cart expiration scheduler stopped unexpectedly.");
            }
            _ = subsys.on_shutdown_requested() => {
                info!("Cart expiration scheduler shutdown.");
            }
        );
        Ok(())
    }
}
