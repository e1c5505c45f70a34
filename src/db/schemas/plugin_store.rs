//! Plugin store row schema
//!
//! Key/value rows namespaced by plugin name. The settings blob is stored as a
//! JSON string under (`unlocked`, `settings`).

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for plugin store rows
pub const PLUGIN_STORE_COLLECTION: &str = "plugin_store_rows";

/// Value type marker for JSON rows
pub const TYPE_JSON: &str = "JSON";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PluginStoreRowDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub plugin_name: String,

    pub key: String,

    #[serde(default)]
    pub type_name: String,

    pub value: String,
}

impl IntoIndexes for PluginStoreRowDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "plugin_name": 1, "key": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("plugin_key_unique".to_string())
                    .build(),
            ),
        )]
    }
}

