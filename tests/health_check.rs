mod common;

use axum::http::StatusCode;
use serial_test::serial;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use common::start_test_server;

#[sqlx::test]
#[serial]
async fn the_webserver_responds_to_a_simple_get_request(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let (shutdown_token, app_state) = start_test_server(connect_options).await;

    let url = format!("http://{}", app_state.settings.application.address());
    let client = httpc_test::new_client(url).expect("Expected client to be created.");
    let res = client
        .do_get("/healthcheck")
        .await
        .expect("Health check should succeed.");

    assert_eq!(res.status(), StatusCode::OK);

    shutdown_token.cancel();
    app_state.pool.close().await;
}
