//! Topic document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for topics
pub const TOPIC_COLLECTION: &str = "topics";

/// Topic document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TopicDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Forum topic id
    pub topic_id: i64,

    pub slug: String,

    pub title: String,

    pub category_id: i64,

    /// Listed topics are visible to everyone; unlisted only to staff
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool {
    true
}

impl IntoIndexes for TopicDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "topic_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("topic_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "slug": 1 },
                Some(IndexOptions::builder().name("slug_index".to_string()).build()),
            ),
        ]
    }
}

