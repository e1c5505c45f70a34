//! NATS messaging for lockgate
//!
//! Used to fan settings cache clears out to every gateway process.

pub mod client;

pub use client::NatsClient;
