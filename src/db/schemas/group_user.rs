//! Group membership document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for group memberships
pub const GROUP_USER_COLLECTION: &str = "group_users";

/// One user's membership in one named group
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GroupUserDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: i64,

    pub group_name: String,
}

impl IntoIndexes for GroupUserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1, "group_name": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_group_unique".to_string())
                    .build(),
            ),
        )]
    }
}

