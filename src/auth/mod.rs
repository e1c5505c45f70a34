//! Viewer authentication for lockgate
//!
//! Bearer JWTs identify the viewer and carry the admin/moderator roles the
//! access gate consults.

pub mod jwt;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput};
