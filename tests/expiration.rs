mod common;

use std::time::Duration;

use cart_commerce::cart::CartStatus;
use cart_commerce::coordinator;
use cart_commerce::product::ProductId;
use cart_commerce::scheduler::ExpirationScheduler;
use rust_decimal::Decimal;
use serial_test::serial;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use common::construct_test_state;

/// spec.md §8 end-to-end scenario 5 ("Expiration"): a cart idle past the
/// timeout is expired on the next scheduler tick, its reservation is
/// released, and further mutation is rejected.
#[sqlx::test]
#[serial]
async fn idle_cart_expires_and_releases_its_reservation(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let state = construct_test_state(connect_options).await;
    let product_id = ProductId::new("P001");
    state
        .product_use_cases
        .create_product(product_id.clone(), "Laptop".to_string(), Decimal::new(499999, 2), 10, String::new())
        .await
        .unwrap();

    let cart_id = state.cart_use_cases.create_cart("user_123".to_string()).await.unwrap();
    coordinator::add_item_to_cart(
        &state.cart_use_cases,
        &state.product_use_cases,
        &state.product_projector,
        cart_id,
        product_id.clone(),
        1,
    )
    .await
    .unwrap();

    // Backdate last_activity by 16 minutes, past the 15-minute default
    // timeout, without waiting in real time.
    sqlx::query("UPDATE cart_read_model SET last_activity = now() - interval '16 minutes' WHERE cart_id = $1")
        .bind(cart_id.into_uuid())
        .execute(&state.pool)
        .await
        .unwrap();

    let scheduler = ExpirationScheduler::new(
        state.cart_projector.clone(),
        state.cart_use_cases.clone(),
        state.product_use_cases.clone(),
        Duration::from_secs(60),
        state.settings.scheduler.timeout_minutes,
    );
    scheduler.run_once().await;

    let cart = state.cart_projector.get(cart_id).await.unwrap().unwrap();
    assert_eq!(cart.status, "EXPIRED");

    let product = state.product_projector.get(&product_id).await.unwrap().unwrap();
    assert_eq!(product.available_stock, 10, "reservation should be released on expiry");
    assert_eq!(product.reserved_stock, 0);

    let cart_aggregate = state.cart_event_store.load_aggregate(cart_id).await.unwrap().unwrap();
    assert_eq!(cart_aggregate.status, CartStatus::Expired);

    let further_add = coordinator::add_item_to_cart(
        &state.cart_use_cases,
        &state.product_use_cases,
        &state.product_projector,
        cart_id,
        product_id.clone(),
        1,
    )
    .await;
    assert!(further_add.is_err(), "mutating an expired cart must be rejected");

    state.pool.close().await;
}
