use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use futures::FutureExt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::select;
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemHandle};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::AppState;
use crate::cart::{CartId, CartProjection};
use crate::coordinator;
use crate::infra::ApiError;
use crate::product::{ProductId, ProductProjection};

pub struct WebServer {
    state: AppState,
}

impl WebServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl IntoSubsystem<anyhow::Error> for WebServer {
    async fn run(self, subsys: SubsystemHandle) -> Result<(), anyhow::Error> {
        let address = self.state.settings.application.address();
        let router = build_router(self.state);

        let listener = tokio::net::TcpListener::bind(address.clone())
            .await
            .inspect_err(|e| error!("Could not bind socket address {address}. Failed with {e}"))?;

        info!("Web server starting on http://{address}");
        select!(
            result = axum::serve(listener, router.into_make_service()).into_future().map(|result| result.map_err(anyhow::Error::new)) => {
                error!("Web server completed with {result:?}");
            }
            _ = subsys.on_shutdown_requested() => {
                info!("Web server shutdown");
            }
        );
        Ok(())
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/cart", axum::routing::post(create_cart_endpoint))
        .route(
            "/api/v1/cart/{id}/items",
            axum::routing::post(add_item_endpoint).delete(remove_item_endpoint),
        )
        .route(
            "/api/v1/cart/{id}/checkout",
            axum::routing::post(checkout_cart_endpoint),
        )
        .route("/api/v1/cart/{id}", get(get_cart_endpoint))
        .route("/api/v1/cart/user/{uid}/carts", get(get_user_carts_endpoint))
        .route(
            "/products",
            get(list_products_endpoint).post(create_product_endpoint),
        )
        .route(
            "/products/{id}/restock",
            axum::routing::post(restock_product_endpoint),
        )
        .route("/healthcheck", get(health_check_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check_endpoint() -> Json<&'static str> {
    Json("Ok")
}

// --- Cart endpoints (spec.md §6) ---

#[derive(Deserialize)]
struct CreateCartRequest {
    user_id: String,
}

#[derive(Serialize)]
struct CreateCartResponse {
    cart_id: CartId,
}

async fn create_cart_endpoint(
    State(state): State<AppState>,
    Json(body): Json<CreateCartRequest>,
) -> Result<(axum::http::StatusCode, Json<CreateCartResponse>), ApiError> {
    let cart_id = state.cart_use_cases.create_cart(body.user_id).await?;
    Ok((axum::http::StatusCode::CREATED, Json(CreateCartResponse { cart_id })))
}

#[derive(Deserialize)]
struct AddItemRequest {
    product_id: String,
    quantity: u32,
}

async fn add_item_endpoint(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
    Json(body): Json<AddItemRequest>,
) -> Result<axum::http::StatusCode, ApiError> {
    if body.quantity == 0 {
        return Err(ApiError::Payload("quantity must be positive".to_string()));
    }
    coordinator::add_item_to_cart(
        &state.cart_use_cases,
        &state.product_use_cases,
        &state.product_projector,
        cart_id,
        ProductId::new(body.product_id),
        body.quantity,
    )
    .await?;
    Ok(axum::http::StatusCode::CREATED)
}

#[derive(Deserialize)]
struct RemoveItemRequest {
    product_id: String,
}

async fn remove_item_endpoint(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
    Json(body): Json<RemoveItemRequest>,
) -> Result<axum::http::StatusCode, ApiError> {
    coordinator::remove_item_from_cart(
        &state.cart_use_cases,
        &state.product_use_cases,
        cart_id,
        ProductId::new(body.product_id),
    )
    .await?;
    Ok(axum::http::StatusCode::OK)
}

#[derive(Serialize)]
struct CheckoutResponse {
    order_id: uuid::Uuid,
    cart_id: CartId,
    total_amount: Decimal,
}

async fn checkout_cart_endpoint(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let order_id = uuid::Uuid::now_v7();
    let total_amount =
        coordinator::checkout_cart(&state.cart_use_cases, &state.product_use_cases, cart_id, order_id)
            .await?;
    Ok(Json(CheckoutResponse {
        order_id,
        cart_id,
        total_amount,
    }))
}

async fn get_cart_endpoint(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
) -> Result<Json<CartProjection>, ApiError> {
    let projection = state
        .cart_projector
        .get(cart_id)
        .await
        .map_err(crate::use_cases::CartUseCaseError::from)?
        .ok_or(crate::use_cases::CartUseCaseError::NotFound(cart_id))?;
    Ok(Json(projection))
}

#[derive(Deserialize)]
struct CartListQuery {
    status: Option<String>,
}

async fn get_user_carts_endpoint(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<CartListQuery>,
) -> Result<Json<Vec<CartProjection>>, ApiError> {
    let carts = state
        .cart_projector
        .get_user_carts(&user_id, query.status.as_deref())
        .await
        .map_err(crate::use_cases::CartUseCaseError::from)?;
    Ok(Json(carts))
}

// --- Product endpoints (spec.md §6) ---

async fn list_products_endpoint(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductProjection>>, ApiError> {
    let products = state
        .product_projector
        .list()
        .await
        .map_err(crate::use_cases::ProductUseCaseError::from)?;
    Ok(Json(products))
}

#[derive(Deserialize)]
struct CreateProductRequest {
    product_id: String,
    name: String,
    price: Decimal,
    initial_stock: u32,
    #[serde(default)]
    description: String,
}

async fn create_product_endpoint(
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<axum::http::StatusCode, ApiError> {
    state
        .product_use_cases
        .create_product(
            ProductId::new(body.product_id),
            body.name,
            body.price,
            body.initial_stock,
            body.description,
        )
        .await?;
    Ok(axum::http::StatusCode::CREATED)
}

#[derive(Deserialize)]
struct RestockRequest {
    quantity: u32,
}

async fn restock_product_endpoint(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Json(body): Json<RestockRequest>,
) -> Result<axum::http::StatusCode, ApiError> {
    state
        .product_use_cases
        .increase_stock(&ProductId::new(product_id), body.quantity)
        .await?;
    Ok(axum::http::StatusCode::OK)
}
