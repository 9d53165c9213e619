//! Validation and inventory errors a `Product` command can return (spec.md §3.3, §7).

use crate::cart::CartId;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProductError {
    #[error("product already created")]
    AlreadyCreated,

    #[error("price cannot be negative")]
    NegativePrice,

    #[error("stock cannot be negative")]
    NegativeStock,

    #[error("quantity must be a positive integer")]
    QuantityMustBePositive,

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("no reservation found for cart {0}")]
    ReservationNotFound(CartId),
}
