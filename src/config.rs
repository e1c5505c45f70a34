//! Configuration for lockgate
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::cache::DEFAULT_NAMESPACE;

/// Minimum accepted JWT secret length outside dev mode
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// lockgate - membership-gated topic access
#[derive(Parser, Debug, Clone)]
#[command(name = "lockgate")]
#[command(about = "Gates topics in locked categories behind group membership")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory stores when MongoDB/NATS are down)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// NATS configuration
    #[command(flatten)]
    pub nats: NatsArgs,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "forum")]
    pub mongodb_db: String,

    /// JWT secret for bearer token validation (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Settings cache namespace; one per tenant when several share NATS
    #[arg(long, env = "CACHE_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub cache_namespace: String,

    /// Site title used in rendered pages
    #[arg(long, env = "SITE_TITLE", default_value = "Forum")]
    pub site_title: String,
}

/// NATS connection configuration
#[derive(Parser, Debug, Clone)]
pub struct NatsArgs {
    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    /// NATS username (optional)
    #[arg(long, env = "NATS_USER")]
    pub nats_user: Option<String>,

    /// NATS password (optional)
    #[arg(long, env = "NATS_PASSWORD")]
    pub nats_password: Option<String>,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match self.jwt_secret.as_deref() {
                None => return Err("JWT_SECRET is required in production mode".to_string()),
                Some(secret) if secret.len() < MIN_JWT_SECRET_LEN => {
                    return Err(format!(
                        "JWT_SECRET must be at least {} characters",
                        MIN_JWT_SECRET_LEN
                    ));
                }
                Some(_) => {}
            }
        }

        if self.cache_namespace.is_empty()
            || self.cache_namespace.contains(['.', '*', '>', ' '])
        {
            return Err("CACHE_NAMESPACE must be a non-empty NATS subject token".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_requires_secret() {
        let args = Args::parse_from(["lockgate", "--jwt-secret", "short"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from([
            "lockgate",
            "--jwt-secret",
            "this-secret-is-at-least-32-chars-long",
        ]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_dev_mode_needs_no_secret() {
        let args = Args::parse_from(["lockgate", "--dev-mode"]);
        assert!(args.dev_mode);
        assert!(args.validate().is_ok());
        assert_eq!(args.cache_namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_namespace_must_be_subject_token() {
        let args = Args::parse_from(["lockgate", "--dev-mode", "--cache-namespace", "a.b"]);
        assert!(args.validate().is_err());
    }
}
