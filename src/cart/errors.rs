//! Validation and lifecycle errors a `Cart` command can return (spec.md §3.3, §7).

use crate::product::ProductId;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart is not in PENDING status")]
    NotPending,

    #[error("quantity must be a positive integer")]
    QuantityMustBePositive,

    #[error("price cannot be negative")]
    NegativePrice,

    #[error("product {0} is not in the cart")]
    ProductNotInCart(ProductId),

    #[error("cannot check out an empty cart")]
    EmptyCart,
}
