//! Read-side collaborators backing the gate and the settings cache
//!
//! The content store (topics, categories, group memberships) and the plugin
//! settings store live outside lockgate. These traits are the seam: MongoDB
//! implementations sit in [`crate::db`], in-memory ones in [`memory`].

pub mod memory;

use async_trait::async_trait;

use crate::cache::LockSettings;
use crate::gate::{Category, Topic};
use crate::types::Result;

pub use memory::{MemoryContentStore, MemorySettingsStore};

/// Topic and category lookups
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Find a topic (with its category) by id
    async fn find_topic(&self, id: i64) -> Result<Option<Topic>>;

    /// Find a topic (with its category) by slug
    async fn find_topic_by_slug(&self, slug: &str) -> Result<Option<Topic>>;

    /// All categories, ordered by id
    async fn list_categories(&self) -> Result<Vec<Category>>;
}

/// Live group membership queries
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Whether `user_id` currently belongs to the group named `group`
    async fn is_member(&self, user_id: i64, group: &str) -> Result<bool>;
}

/// Durable storage for the plugin settings blob
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the settings row, `None` if it was never written
    async fn load(&self) -> Result<Option<LockSettings>>;

    /// Replace the settings row
    async fn save(&self, settings: &LockSettings) -> Result<()>;
}
