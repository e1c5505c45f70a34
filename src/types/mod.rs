//! Shared types for lockgate

pub mod error;

pub use error::{GateError, Result};
