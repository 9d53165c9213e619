pub mod cart;
pub mod coordinator;
pub mod event_sourcing;
pub mod infra;
mod macros;
pub mod product;
pub mod scheduler;
pub mod subsystems;
pub mod use_cases;

use std::time::Duration;

use anyhow::Context;
use axum::extract::FromRef;
use cart::{CartEventStore, CartProjector};
use infra::{DatabaseSettings, Settings};
use product::{ProductEventStore, ProductProjector};
use scheduler::ExpirationScheduler;
use sqlx::{PgPool, postgres::PgPoolOptions};
use subsystems::WebServer;
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemBuilder, Toplevel};
use tracing_appender::non_blocking::WorkerGuard;
use use_cases::{CartUseCases, ProductUseCases};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Settings,
    pub pool: PgPool,
    pub cart_event_store: CartEventStore,
    pub product_event_store: ProductEventStore,
    pub cart_projector: CartProjector,
    pub product_projector: ProductProjector,
    pub cart_use_cases: CartUseCases,
    pub product_use_cases: ProductUseCases,
}

pub fn build_subsystems(state: AppState) -> Toplevel {
    let scheduler = ExpirationScheduler::new(
        state.cart_projector.clone(),
        state.cart_use_cases.clone(),
        state.product_use_cases.clone(),
        Duration::from_secs(state.settings.scheduler.interval_seconds),
        state.settings.scheduler.timeout_minutes,
    );
    let webserver = WebServer::new(state);

    Toplevel::new(async |s| {
        s.start(SubsystemBuilder::new(
            "ExpirationScheduler",
            scheduler.into_subsystem(),
        ));
        s.start(SubsystemBuilder::new(
            "Webserver",
            webserver.into_subsystem(),
        ));
    })
}

pub async fn test_server(toplevel: Toplevel, pool: PgPool) -> anyhow::Result<()> {
    let result = toplevel
        .handle_shutdown_requests(Duration::from_millis(2000))
        .await
        .map_err(Into::into);
    pool.close().await;
    result
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    build_subsystems(state)
        .catch_signals()
        .handle_shutdown_requests(Duration::from_millis(2000))
        .await
        .map_err(Into::into)
}

pub fn configure_tracing(settings: &Settings) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(
        settings.application.logs_directory.clone(),
        "cart_commerce.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(non_blocking)
        .init();
    _guard
}

pub async fn construct_app_state(settings: Settings) -> Result<AppState, anyhow::Error> {
    let pool = construct_db_pool(&settings.database).await?;

    let cart_event_store = CartEventStore::new(pool.clone());
    let product_event_store = ProductEventStore::new(pool.clone());
    let cart_projector = CartProjector::new(pool.clone());
    let product_projector = ProductProjector::new(pool.clone());

    let cart_use_cases = CartUseCases::new(
        cart_event_store.clone(),
        cart_projector.clone(),
        settings.retry.max_attempts,
    );
    let product_use_cases = ProductUseCases::new(
        product_event_store.clone(),
        product_projector.clone(),
        settings.retry.max_attempts,
        settings.scheduler.reservation_minutes,
    );

    Ok(AppState {
        settings,
        pool,
        cart_event_store,
        product_event_store,
        cart_projector,
        product_projector,
        cart_use_cases,
        product_use_cases,
    })
}

pub async fn construct_db_pool(settings: &DatabaseSettings) -> Result<PgPool, anyhow::Error> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_with(settings.with_db_name())
        .await
        .context("Failed to connect to Postgres database.\n1. Check database is running.\n2. Check Postgres database settings in configuration file(s).")
}

/// Rebuilds `cart_read_model`/`product_read_model` from the event stores,
/// for the `--reset-read-models` CLI flag (spec.md §9).
pub async fn reset_read_models(state: &AppState) -> Result<(), anyhow::Error> {
    sqlx::query("TRUNCATE TABLE cart_read_model")
        .execute(&state.pool)
        .await?;
    sqlx::query("TRUNCATE TABLE product_read_model")
        .execute(&state.pool)
        .await?;

    let cart_ids: Vec<uuid::Uuid> = sqlx::query_scalar("SELECT DISTINCT aggregate_id FROM cart_events")
        .fetch_all(&state.pool)
        .await?;
    for raw_id in cart_ids {
        let cart_id = cart::CartId::from(raw_id);
        if let Some(cart) = state.cart_event_store.load_aggregate(cart_id).await? {
            state.cart_projector.project(&cart, jiff::Timestamp::now()).await?;
        }
    }

    let product_ids: Vec<String> = sqlx::query_scalar("SELECT DISTINCT aggregate_id FROM product_events")
        .fetch_all(&state.pool)
        .await?;
    for raw_id in product_ids {
        let product_id = product::ProductId::new(raw_id);
        if let Some(product) = state.product_event_store.load_aggregate(&product_id).await? {
            state
                .product_projector
                .project(&product, jiff::Timestamp::now())
                .await?;
        }
    }

    Ok(())
}
