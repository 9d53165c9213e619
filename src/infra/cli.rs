use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cart_commerce", about = "Event-sourced cart and inventory service")]
pub struct Cli {
    /// Drop and rebuild `cart_read_model`/`product_read_model` from the event
    /// stores before starting the server (spec.md §9).
    #[arg(long)]
    pub reset_read_models: bool,

    /// Run only the expiration scheduler subsystem, without the web server.
    /// Useful for running the scheduler as its own deployable process.
    #[arg(long)]
    pub run_scheduler_only: bool,
}
