//! Grounded on `checkout_integrated.py`: check out the cart aggregate, then
//! complete each item's reservation (release + permanent stock decrease).
//! A failure completing one item's reservation is logged and does not
//! unwind the checkout — the cart is already sold, so this is recorded as a
//! reconciliation backlog rather than retried inline (spec.md §4.5, §9 open
//! question on partial-completion handling).

use rust_decimal::Decimal;
use tracing::error;

use crate::cart::CartId;
use crate::use_cases::{CartUseCases, ProductUseCases};

use super::CoordinatorError;

pub async fn checkout_cart(
    cart_use_cases: &CartUseCases,
    product_use_cases: &ProductUseCases,
    cart_id: CartId,
    order_id: uuid::Uuid,
) -> Result<Decimal, CoordinatorError> {
    let cart = cart_use_cases.checkout(cart_id, order_id).await?;
    let total_amount = cart.total_amount();

    for item in cart.items.values() {
        if let Err(err) = product_use_cases
            .checkout_reservation(&item.product_id, cart_id, order_id)
            .await
        {
            error!(
                %cart_id,
                product_id = %item.product_id,
                %order_id,
                error = %err,
                "failed to complete product reservation after checkout; stock reconciliation required",
            );
        }
    }

    Ok(total_amount)
}
