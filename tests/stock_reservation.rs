mod common;

use cart_commerce::cart::CartId;
use cart_commerce::product::ProductId;
use cart_commerce::{coordinator, use_cases::CartUseCaseError};
use rust_decimal::Decimal;
use serial_test::serial;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use common::construct_test_state;

/// spec.md §8 end-to-end scenario 3 ("Insufficient stock"): reserving more
/// than is available is rejected before the cart is ever touched, and no
/// reservation event is persisted.
#[sqlx::test]
#[serial]
async fn reserving_more_than_available_stock_leaves_the_cart_untouched(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let state = construct_test_state(connect_options).await;
    let product_id = ProductId::new("P-LOW-STOCK");
    state
        .product_use_cases
        .create_product(product_id.clone(), "Scarce Widget".to_string(), Decimal::new(999, 2), 5, String::new())
        .await
        .unwrap();

    let cart_id = state.cart_use_cases.create_cart("user_1".to_string()).await.unwrap();

    let result = coordinator::add_item_to_cart(
        &state.cart_use_cases,
        &state.product_use_cases,
        &state.product_projector,
        cart_id,
        product_id.clone(),
        10,
    )
    .await;
    assert!(result.is_err());

    let cart = state.cart_event_store.load_aggregate(cart_id).await.unwrap().unwrap();
    assert!(cart.items.is_empty());

    let product = state.product_projector.get(&product_id).await.unwrap().unwrap();
    assert_eq!(product.available_stock, 5);
    assert_eq!(product.reserved_stock, 0);

    state.pool.close().await;
}

/// spec.md §8 end-to-end scenario 4 ("Compensation"): when the cart-side
/// step of the coordinated add fails after stock was already reserved, the
/// reservation is released and the stock becomes available again.
#[sqlx::test]
#[serial]
async fn failed_cart_step_compensates_by_releasing_the_reservation(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let state = construct_test_state(connect_options).await;
    let product_id = ProductId::new("P-COMPENSATE");
    state
        .product_use_cases
        .create_product(product_id.clone(), "Widget".to_string(), Decimal::new(999, 2), 5, String::new())
        .await
        .unwrap();

    let cart_a = state.cart_use_cases.create_cart("user_a".to_string()).await.unwrap();
    coordinator::add_item_to_cart(
        &state.cart_use_cases,
        &state.product_use_cases,
        &state.product_projector,
        cart_a,
        product_id.clone(),
        3,
    )
    .await
    .unwrap();

    let product = state.product_projector.get(&product_id).await.unwrap().unwrap();
    assert_eq!(product.available_stock, 2);

    // `cart_b` was never created, so the cart-side step of the coordinated
    // add fails with `NotFound` after stock has already been reserved.
    let cart_b = CartId::new();
    let result = coordinator::add_item_to_cart(
        &state.cart_use_cases,
        &state.product_use_cases,
        &state.product_projector,
        cart_b,
        product_id.clone(),
        1,
    )
    .await;
    assert!(matches!(
        result,
        Err(coordinator::CoordinatorError::Cart(CartUseCaseError::NotFound(_)))
    ));

    let product = state.product_projector.get(&product_id).await.unwrap().unwrap();
    assert_eq!(product.available_stock, 2, "compensation should restore stock reserved for cart_b");
    assert_eq!(product.reserved_stock, 3, "cart_a's reservation should be untouched");

    state.pool.close().await;
}
