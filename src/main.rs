use anyhow::Context;
use cart_commerce::{
    configure_tracing, construct_app_state, reset_read_models,
    infra::{Cli, get_config_settings},
    start_server,
};
use clap::Parser;
use tokio_graceful_shutdown::IntoSubsystem;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = get_config_settings().context("Could not read application configuration.")?;

    // _worker_guard is pulled back into the scope of main() to ensure all tracing events get
    // written to the log file when the program terminates, which is done when _worker_guard is
    // dropped.
    let _worker_guard = configure_tracing(&settings);

    let app_state = construct_app_state(settings).await?;

    if cli.reset_read_models {
        reset_read_models(&app_state).await?;
    }

    if cli.run_scheduler_only {
        return run_scheduler_only(app_state).await;
    }

    start_server(app_state).await
}

async fn run_scheduler_only(state: cart_commerce::AppState) -> anyhow::Result<()> {
    use std::time::Duration;
    use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

    let scheduler = cart_commerce::scheduler::ExpirationScheduler::new(
        state.cart_projector.clone(),
        state.cart_use_cases.clone(),
        state.product_use_cases.clone(),
        Duration::from_secs(state.settings.scheduler.interval_seconds),
        state.settings.scheduler.timeout_minutes,
    );

    Toplevel::new(async |s| {
        s.start(SubsystemBuilder::new(
            "ExpirationScheduler",
            scheduler.into_subsystem(),
        ));
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_millis(2000))
    .await
    .map_err(Into::into)
}
