mod cli;
mod config;
mod error;

pub use cli::Cli;
pub use config::{DatabaseSettings, RetrySettings, SchedulerSettings, Settings, get_config_settings};
pub use error::ApiError;
