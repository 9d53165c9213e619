//! Removing an item from a cart always releases the matching reservation,
//! even though the reverse of `add_item_to_cart` doesn't need to compensate
//! on failure — there's nothing to roll back to (spec.md §4.5).

use tracing::error;

use crate::cart::CartId;
use crate::product::ProductId;
use crate::use_cases::{CartUseCases, ProductUseCases};

use super::CoordinatorError;

pub async fn remove_item_from_cart(
    cart_use_cases: &CartUseCases,
    product_use_cases: &ProductUseCases,
    cart_id: CartId,
    product_id: ProductId,
) -> Result<(), CoordinatorError> {
    cart_use_cases.remove_item(cart_id, product_id.clone()).await?;

    if let Err(err) = product_use_cases
        .release_reservation(&product_id, cart_id, "item_removed".to_string())
        .await
    {
        error!(%cart_id, %product_id, error = %err, "failed to release reservation after item removal");
    }

    Ok(())
}
