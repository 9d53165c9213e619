//! Cross-aggregate coordination between `cart` and `product` (spec.md §4.5).
//!
//! There is no two-phase commit here: each step commits its own aggregate
//! independently, and a failure after the product side has already
//! committed is cleaned up with a compensating command rather than rolled
//! back. A compensation that itself fails is logged, never allowed to mask
//! the primary error — see `add_item_to_cart`'s design note, lifted
//! directly from `add_item_integrated.py`.

mod add_item_to_cart;
mod checkout_cart;
mod remove_item_from_cart;

pub use add_item_to_cart::add_item_to_cart;
pub use checkout_cart::checkout_cart;
pub use remove_item_from_cart::remove_item_from_cart;

use crate::product::ProductId;
use crate::use_cases::{CartUseCaseError, ProductUseCaseError};

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error(transparent)]
    Cart(#[from] CartUseCaseError),

    #[error(transparent)]
    Product(#[from] ProductUseCaseError),
}
