//! Database schemas for lockgate
//!
//! Read models of the forum's categories, topics and group memberships, plus
//! the plugin store row holding the settings blob.

mod category;
mod group_user;
mod metadata;
mod plugin_store;
mod topic;

pub use category::{CategoryDoc, CATEGORY_COLLECTION};
pub use group_user::{GroupUserDoc, GROUP_USER_COLLECTION};
pub use metadata::Metadata;
pub use plugin_store::{PluginStoreRowDoc, PLUGIN_STORE_COLLECTION, TYPE_JSON};
pub use topic::{TopicDoc, TOPIC_COLLECTION};
