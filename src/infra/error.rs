use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::coordinator::CoordinatorError;
use crate::event_sourcing::EventStoreError;
use crate::use_cases::{CartUseCaseError, ProductUseCaseError};

/// Maps every error surfaced by a handler onto an HTTP status (spec.md §6, §7).
#[derive(Debug)]
pub enum ApiError {
    Cart(CartUseCaseError),
    Product(ProductUseCaseError),
    Coordinator(CoordinatorError),
    Payload(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(serde::Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let (status, message) = match self {
            ApiError::Cart(err) => cart_status(&err, err.to_string()),
            ApiError::Product(err) => product_status(&err, err.to_string()),
            ApiError::Coordinator(err) => coordinator_status(err),
            ApiError::Payload(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Please ask your system administrator to check the logs.".to_owned(),
            ),
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

fn event_store_status(err: &EventStoreError) -> StatusCode {
    match err {
        EventStoreError::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
        EventStoreError::UnknownEventType(_) | EventStoreError::Database(_) | EventStoreError::Serde(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn cart_status(err: &CartUseCaseError, message: String) -> (StatusCode, String) {
    let status = match err {
        CartUseCaseError::NotFound(_) => StatusCode::NOT_FOUND,
        CartUseCaseError::Cart(_) => StatusCode::BAD_REQUEST,
        CartUseCaseError::Store(store_err) => event_store_status(store_err),
    };
    (status, message)
}

fn product_status(err: &ProductUseCaseError, message: String) -> (StatusCode, String) {
    let status = match err {
        ProductUseCaseError::NotFound(_) => StatusCode::NOT_FOUND,
        ProductUseCaseError::Product(_) => StatusCode::BAD_REQUEST,
        ProductUseCaseError::Store(store_err) => event_store_status(store_err),
    };
    (status, message)
}

fn coordinator_status(err: CoordinatorError) -> (StatusCode, String) {
    let message = err.to_string();
    let status = match err {
        CoordinatorError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        CoordinatorError::Cart(cart_err) => return cart_status(&cart_err, message),
        CoordinatorError::Product(product_err) => return product_status(&product_err, message),
    };
    (status, message)
}

impl From<CartUseCaseError> for ApiError {
    fn from(err: CartUseCaseError) -> Self {
        ApiError::Cart(err)
    }
}

impl From<ProductUseCaseError> for ApiError {
    fn from(err: ProductUseCaseError) -> Self {
        ApiError::Product(err)
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        ApiError::Coordinator(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        ApiError::Internal(value)
    }
}
