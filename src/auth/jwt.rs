//! JWT bearer tokens identifying the viewer
//!
//! Tokens are issued by the forum's session layer and signed with HS256.
//! lockgate only validates them and maps the claims to a [`Viewer`].

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::MIN_JWT_SECRET_LEN;
use crate::gate::Viewer;
use crate::types::GateError;

/// Payload stored in a viewer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub moderator: bool,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl Claims {
    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: Some(self.user_id),
            username: Some(self.username.clone()),
            is_admin: self.admin,
            is_moderator: self.moderator,
        }
    }
}

/// Input for creating a new token
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub user_id: i64,
    pub username: String,
    pub admin: bool,
    pub moderator: bool,
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, GateError> {
        if secret.is_empty() {
            return Err(GateError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(GateError::Config(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_JWT_SECRET_LEN
            )));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Create a validator for dev mode
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            expiry_seconds: 3600,
        }
    }

    /// Generate a token; used by dev tooling and tests
    pub fn generate_token(&self, input: TokenInput) -> Result<String, GateError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| GateError::Auth(format!("System time error: {}", e)))?
            .as_secs();

        let claims = Claims {
            user_id: input.user_id,
            username: input.username,
            admin: input.admin,
            moderator: input.moderator,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| GateError::Auth(format!("Failed to generate token: {}", e)))
    }

    /// Verify and decode a token
    pub fn verify_token(&self, token: &str) -> Result<Claims, GateError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let msg = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidToken => "Invalid token",
                ErrorKind::InvalidSignature => "Invalid signature",
                _ => "Token validation failed",
            };
            GateError::Unauthorized(msg.into())
        })
    }

    /// Resolve the viewer for an `Authorization` header value
    ///
    /// No header means an anonymous viewer; a bad token is rejected.
    pub fn viewer_from_header(&self, auth_header: Option<&str>) -> Result<Viewer, GateError> {
        match extract_token_from_header(auth_header) {
            Some(token) => Ok(self.verify_token(token)?.viewer()),
            None if auth_header.map_or(true, |h| h.trim().is_empty()) => Ok(Viewer::anonymous()),
            None => Err(GateError::Unauthorized("Malformed Authorization header".into())),
        }
    }
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}
