mod common;

use cart_commerce::event_sourcing::EventStoreError;
use serial_test::serial;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use common::construct_test_state;

/// spec.md §8.4 ("Optimistic concurrency"): two writers racing to append
/// events for the same cart at the same `expected_version` produce exactly
/// one success and one `ConcurrencyConflict`.
#[sqlx::test]
#[serial]
async fn two_concurrent_saves_at_the_same_version_yield_one_winner(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let state = construct_test_state(connect_options).await;
    let cart_id = state.cart_use_cases.create_cart("user_race".to_string()).await.unwrap();

    let mut cart_a = state.cart_event_store.load_aggregate(cart_id).await.unwrap().unwrap();
    cart_a
        .add_item(
            cart_commerce::product::ProductId::new("P-RACE"),
            "Racey Widget".to_string(),
            rust_decimal::Decimal::new(100, 2),
            1,
        )
        .unwrap();

    let mut cart_b = state.cart_event_store.load_aggregate(cart_id).await.unwrap().unwrap();
    cart_b
        .add_item(
            cart_commerce::product::ProductId::new("P-RACE"),
            "Racey Widget".to_string(),
            rust_decimal::Decimal::new(100, 2),
            1,
        )
        .unwrap();

    // Both replicas were loaded at version 1, so both compute the same
    // `expected_version`. Only one of the two concurrent appends may win.
    let expected_version = cart_a.version - cart_a.uncommitted_events().len() as i64;
    assert_eq!(
        expected_version,
        cart_b.version - cart_b.uncommitted_events().len() as i64
    );

    let (result_a, result_b) = tokio::join!(
        state
            .cart_event_store
            .save(cart_id, expected_version, cart_a.uncommitted_events()),
        state
            .cart_event_store
            .save(cart_id, expected_version, cart_b.uncommitted_events()),
    );

    let outcomes = [result_a.is_ok(), result_b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1, "exactly one writer should win");

    let loser = if result_a.is_err() { result_a } else { result_b };
    assert!(matches!(loser.unwrap_err(), EventStoreError::ConcurrencyConflict { .. }));

    let events = state.cart_event_store.get_events(cart_id).await.unwrap();
    assert_eq!(events.len(), 2, "only the winner's single event plus CartCreated should persist");

    state.pool.close().await;
}
