//! Background expiration of inactive carts (spec.md §4.6), run as a
//! `tokio_graceful_shutdown` subsystem alongside the web server.

mod expiration;

pub use expiration::ExpirationScheduler;
