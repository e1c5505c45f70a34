//! Cross-process settings cache invalidation
//!
//! A clear in one lockgate process is published on NATS; every process
//! subscribes and clears its local cache when another origin publishes.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ConfigCache;
use crate::nats::NatsClient;
use crate::types::Result;

/// Subject carrying clear notifications for a cache namespace
pub fn clear_subject(namespace: &str) -> String {
    format!("lockgate.cache.{}.clear", namespace)
}

/// Clear notification published on [`clear_subject`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationMessage {
    pub namespace: String,
    /// Node that issued the clear
    pub origin: Uuid,
    pub issued_at: DateTime<Utc>,
}

/// Fan-out for cache clears
#[async_trait]
pub trait InvalidationBus: Send + Sync {
    /// Tell every other process to drop its cached settings for `namespace`
    async fn publish_clear(&self, namespace: &str) -> Result<()>;
}

/// Single-process deployments: nothing to notify
pub struct LocalInvalidation;

#[async_trait]
impl InvalidationBus for LocalInvalidation {
    async fn publish_clear(&self, namespace: &str) -> Result<()> {
        debug!(namespace, "Local-only cache clear, no fan-out");
        Ok(())
    }
}

/// NATS-backed fan-out
pub struct NatsInvalidation {
    client: NatsClient,
    origin: Uuid,
}

impl NatsInvalidation {
    pub fn new(client: NatsClient, origin: Uuid) -> Self {
        Self { client, origin }
    }
}

#[async_trait]
impl InvalidationBus for NatsInvalidation {
    async fn publish_clear(&self, namespace: &str) -> Result<()> {
        let message = InvalidationMessage {
            namespace: namespace.to_string(),
            origin: self.origin,
            issued_at: Utc::now(),
        };
        let payload = serde_json::to_vec(&message)?;
        self.client
            .publish(&clear_subject(namespace), Bytes::from(payload))
            .await?;
        debug!(namespace, origin = %self.origin, "Published cache clear");
        Ok(())
    }
}

/// Whether a received notification should clear the local cache
pub fn should_apply(message: &InvalidationMessage, namespace: &str, local_origin: Uuid) -> bool {
    message.namespace == namespace && message.origin != local_origin
}

/// Subscribe to clears from other processes and apply them locally
///
/// The returned handle is aborted at shutdown.
pub async fn spawn_invalidation_listener(
    client: NatsClient,
    cache: Arc<ConfigCache>,
    local_origin: Uuid,
) -> Result<JoinHandle<()>> {
    let namespace = cache.namespace().to_string();
    let subject = clear_subject(&namespace);
    let mut subscriber = client.subscribe(&subject).await?;

    info!(subject = %subject, "Settings invalidation listener started");

    Ok(tokio::spawn(async move {
        while let Some(msg) = subscriber.next().await {
            match serde_json::from_slice::<InvalidationMessage>(&msg.payload) {
                Ok(message) if should_apply(&message, &namespace, local_origin) => {
                    debug!(origin = %message.origin, "Applying remote cache clear");
                    cache.clear_local();
                }
                Ok(_) => {}
                Err(e) => {
                    // Unknown payload: clearing is always safe
                    warn!(error = %e, "Malformed invalidation message, clearing anyway");
                    cache.clear_local();
                }
            }
        }
        warn!(subject = %subject, "Settings invalidation subscription closed");
    }))
}
