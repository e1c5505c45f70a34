//! lockgate - membership-gated topic access
//!
//! Categories can carry a lock: an external asset address plus a required
//! membership group. lockgate decides, per topic view, whether the viewer may
//! read the topic, and answers locked views with `402 Payment Required` and
//! enough metadata for the client to start an unlock flow.
//!
//! ## Components
//!
//! - **Gate**: the lock predicate, run after standard visibility checks
//! - **Cache**: process-wide settings cache with NATS fan-out on clear
//! - **Routes**: topic view pipeline, 402 responses, page preload, admin settings
//! - **Stores**: MongoDB (production) and in-memory (dev, tests) collaborators

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod gate;
pub mod nats;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GateError, Result};
