//! NATS client wrapper
//!
//! Connection management with credentials and a bounded connect timeout.

use async_nats::{Client, ConnectOptions};
use bytes::Bytes;
use std::time::Duration;
use tracing::info;

use crate::config::NatsArgs;
use crate::types::GateError;

/// Default ping interval for keep-alive
const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(120);

/// Fail fast when NATS is unreachable at startup
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// NATS client wrapper
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
    name: String,
}

impl NatsClient {
    /// Connect to the configured NATS server
    pub async fn new(args: &NatsArgs, name: &str) -> Result<Self, GateError> {
        info!("Connecting to NATS at {}", args.nats_url);

        // No retry_on_initial_connect(): dev mode falls back to local-only invalidation
        let mut options = ConnectOptions::new()
            .name(name)
            .ping_interval(DEFAULT_PING_INTERVAL)
            .connection_timeout(CONNECT_TIMEOUT);

        if let (Some(user), Some(pass)) = (&args.nats_user, &args.nats_password) {
            options = options.user_and_password(user.clone(), pass.clone());
        }

        let client = options
            .connect(&args.nats_url)
            .await
            .map_err(|e| GateError::Nats(format!("Failed to connect: {}", e)))?;

        info!("Connected to NATS at {}", args.nats_url);

        Ok(Self {
            client,
            name: name.to_string(),
        })
    }

    /// Publish a message to a subject
    pub async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), GateError> {
        self.client
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| GateError::Nats(format!("Publish failed: {}", e)))
    }

    /// Subscribe to a subject
    pub async fn subscribe(&self, subject: &str) -> Result<async_nats::Subscriber, GateError> {
        self.client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| GateError::Nats(format!("Subscribe failed: {}", e)))
    }

    /// Flush pending messages
    pub async fn flush(&self) -> Result<(), GateError> {
        self.client
            .flush()
            .await
            .map_err(|e| GateError::Nats(format!("Flush failed: {}", e)))
    }

    /// Get the client name
    pub fn name(&self) -> &str {
        &self.name
    }
}
