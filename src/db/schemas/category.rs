//! Category document schema
//!
//! Lock configuration lives in the category's custom fields.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;
use crate::gate::{Category, CategoryLock, CF_LOCK_ADDRESS, CF_LOCK_GROUP, CF_LOCK_ICON};

/// Collection name for categories
pub const CATEGORY_COLLECTION: &str = "categories";

/// Category document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CategoryDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Forum category id
    pub category_id: i64,

    pub name: String,

    pub slug: String,

    /// Free-form custom fields (`unlock-lock`, `unlock-icon`, `unlock-group`, ...)
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

impl CategoryDoc {
    pub fn lock(&self) -> CategoryLock {
        CategoryLock {
            lock_address: self.custom_fields.get(CF_LOCK_ADDRESS).cloned(),
            lock_icon: self.custom_fields.get(CF_LOCK_ICON).cloned(),
            required_group: self.custom_fields.get(CF_LOCK_GROUP).cloned(),
        }
    }

    pub fn into_category(self) -> Category {
        let lock = self.lock();
        Category {
            id: self.category_id,
            name: self.name,
            slug: self.slug,
            lock,
        }
    }
}

impl IntoIndexes for CategoryDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "category_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("category_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}
