//! HTTP server and shared state

pub mod http;

pub use http::{dispatch, run, AppState, Stores};
