//! Grounded on `add_item_integrated.py`: reserve stock, then add the item to
//! the cart; if the cart step fails, release the reservation so stock isn't
//! stranded (spec.md §4.5, §8 compensation scenario).

use tracing::error;

use crate::cart::CartId;
use crate::product::{ProductId, ProductProjector};
use crate::use_cases::{CartUseCases, ProductUseCases};

use super::CoordinatorError;

pub async fn add_item_to_cart(
    cart_use_cases: &CartUseCases,
    product_use_cases: &ProductUseCases,
    product_projector: &ProductProjector,
    cart_id: CartId,
    product_id: ProductId,
    quantity: u32,
) -> Result<(), CoordinatorError> {
    let product = product_projector
        .get(&product_id)
        .await
        .map_err(crate::use_cases::ProductUseCaseError::from)?
        .ok_or_else(|| CoordinatorError::ProductNotFound(product_id.clone()))?;

    product_use_cases
        .reserve_stock(&product_id, cart_id, quantity)
        .await?;

    let add_result = cart_use_cases
        .add_item(
            cart_id,
            product_id.clone(),
            product.name,
            product.price,
            quantity,
        )
        .await;

    if let Err(err) = add_result {
        if let Err(compensation_err) = product_use_cases
            .release_reservation(&product_id, cart_id, "cart_operation_failed".to_string())
            .await
        {
            error!(
                %cart_id,
                %product_id,
                primary_error = %err,
                compensation_error = %compensation_err,
                "failed to release reservation after cart operation failed",
            );
        }
        return Err(err.into());
    }

    Ok(())
}
