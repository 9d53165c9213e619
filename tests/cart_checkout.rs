mod common;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use serial_test::serial;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use common::start_test_server;

async fn create_product(client: &httpc_test::Client, product_id: &str, price: &str, stock: u32) {
    client
        .do_post(
            "/products",
            json!({
                "product_id": product_id,
                "name": "Laptop",
                "price": price,
                "initial_stock": stock,
                "description": "A laptop",
            }),
        )
        .await
        .expect("product creation should succeed");
}

async fn create_cart(client: &httpc_test::Client, user_id: &str) -> String {
    let res = client
        .do_post("/api/v1/cart", json!({ "user_id": user_id }))
        .await
        .expect("cart creation should succeed");
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json_body_as::<serde_json::Value>().unwrap()["cart_id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// spec.md §8 end-to-end scenario 1 ("Happy path"): create a product, add
/// two units to a fresh cart, check out, and observe both the cart and
/// product projections settle on the expected totals.
#[sqlx::test]
#[serial]
async fn happy_path_checkout_settles_cart_and_product_totals(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let (shutdown_token, app_state) = start_test_server(connect_options).await;
    let url = format!("http://{}", app_state.settings.application.address());
    let client = httpc_test::new_client(url).expect("Expected client to be created.");

    create_product(&client, "P001", "4999.99", 10).await;
    let cart_id = create_cart(&client, "user_123").await;

    let add_res = client
        .do_post(
            &format!("/api/v1/cart/{cart_id}/items"),
            json!({ "product_id": "P001", "quantity": 2 }),
        )
        .await
        .expect("add item should succeed");
    assert_eq!(add_res.status(), StatusCode::CREATED);

    let checkout_res = client
        .do_post(&format!("/api/v1/cart/{cart_id}/checkout"), json!({}))
        .await
        .expect("checkout should succeed");
    assert_eq!(checkout_res.status(), StatusCode::OK);
    let checkout_body = checkout_res.json_body_as::<serde_json::Value>().unwrap();
    let total_amount: Decimal = checkout_body["total_amount"].as_str().unwrap().parse().unwrap();
    assert_eq!(total_amount, Decimal::new(999998, 2));

    let cart = client
        .do_get(&format!("/api/v1/cart/{cart_id}"))
        .await
        .expect("cart read should succeed")
        .json_body_as::<serde_json::Value>()
        .unwrap();
    assert_eq!(cart["status"], "CHECKED_OUT");

    let products = client
        .do_get("/products")
        .await
        .expect("product list should succeed")
        .json_body_as::<serde_json::Value>()
        .unwrap();
    let laptop = products
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["product_id"] == "P001")
        .unwrap();
    assert_eq!(laptop["total_stock"], 8);
    assert_eq!(laptop["reserved_stock"], 0);

    shutdown_token.cancel();
    app_state.pool.close().await;
}

/// spec.md §8 scenario 2 ("Duplicate add merges"): adding the same product
/// twice sums the quantity into a single line item rather than two.
#[sqlx::test]
#[serial]
async fn adding_the_same_product_twice_merges_into_one_line_item(
    _pool_options: PgPoolOptions,
    connect_options: PgConnectOptions,
) {
    let (shutdown_token, app_state) = start_test_server(connect_options).await;
    let url = format!("http://{}", app_state.settings.application.address());
    let client = httpc_test::new_client(url).expect("Expected client to be created.");

    create_product(&client, "P002", "10.00", 20).await;
    let cart_id = create_cart(&client, "user_456").await;

    client
        .do_post(
            &format!("/api/v1/cart/{cart_id}/items"),
            json!({ "product_id": "P002", "quantity": 1 }),
        )
        .await
        .expect("first add should succeed");
    client
        .do_post(
            &format!("/api/v1/cart/{cart_id}/items"),
            json!({ "product_id": "P002", "quantity": 2 }),
        )
        .await
        .expect("second add should succeed");

    let cart = client
        .do_get(&format!("/api/v1/cart/{cart_id}"))
        .await
        .expect("cart read should succeed")
        .json_body_as::<serde_json::Value>()
        .unwrap();
    assert_eq!(cart["item_count"], 3);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);

    shutdown_token.cancel();
    app_state.pool.close().await;
}
