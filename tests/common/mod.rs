use std::future::Future;
use std::time::Duration;

use cart_commerce::{AppState, build_subsystems, construct_app_state, infra::get_config_settings, test_server};
use sqlx::postgres::PgConnectOptions;
use tokio_util::sync::CancellationToken;

/// Boots a full `AppState` (event stores, projectors, use cases, HTTP
/// server, expiration scheduler) against the database `sqlx::test` just
/// created, and hands back a token the test can cancel to shut it down
/// cleanly (mirrors the teacher's `tests/cart/test_utils.rs`).
pub async fn start_test_server(connect_options: PgConnectOptions) -> (CancellationToken, AppState) {
    let mut settings = get_config_settings().expect("Could not read application configuration.");
    settings.database.database_name = connect_options
        .get_database()
        .expect("Expected database name.")
        .into();

    let app_state = construct_app_state(settings)
        .await
        .expect("Expected AppState to be created.");
    let pool = app_state.pool.clone();
    let subsystems = build_subsystems(app_state.clone());
    let shutdown_token = subsystems._get_shutdown_token().clone();
    tokio::task::spawn(test_server(subsystems, pool));

    (shutdown_token, app_state)
}

/// Builds an `AppState` against the database `sqlx::test` just created,
/// without starting the web server or scheduler subsystems — for tests that
/// exercise the aggregates/use cases/coordinator directly.
pub async fn construct_test_state(connect_options: PgConnectOptions) -> AppState {
    let mut settings = get_config_settings().expect("Could not read application configuration.");
    settings.database.database_name = connect_options
        .get_database()
        .expect("Expected database name.")
        .into();

    construct_app_state(settings)
        .await
        .expect("Expected AppState to be created.")
}

/// Retries `f` every 200ms until it returns `expected`, or panics after 10s.
/// Used for assertions against state the HTTP layer or scheduler updates
/// asynchronously (e.g. waiting on a projection to catch up).
pub async fn assert_until_eq<F, Fut, T, E>(f: F, expected: T, label: &str)
where
    F: Fn() -> Fut,
    E: std::fmt::Debug,
    Fut: Future<Output = Result<T, E>>,
    T: PartialEq + std::fmt::Debug,
{
    let delay = Duration::from_millis(200);
    let max_attempts = 50;
    let mut attempt = 0;
    let mut result = f().await.expect("assert_until_eq: operation failed");
    while attempt < max_attempts && result != expected {
        attempt += 1;
        tokio::time::sleep(delay).await;
        result = f().await.expect("assert_until_eq: operation failed");
    }
    assert_eq!(result, expected, "timed out waiting for {label}");
}
