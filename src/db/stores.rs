//! MongoDB implementations of the store traits

use async_trait::async_trait;
use bson::doc;
use tracing::warn;

use crate::cache::{LockSettings, PLUGIN_NAME, SETTINGS_KEY};
use crate::db::mongo::{touch_metadata, MongoClient, MongoCollection};
use crate::db::schemas::{
    CategoryDoc, GroupUserDoc, PluginStoreRowDoc, TopicDoc, CATEGORY_COLLECTION,
    GROUP_USER_COLLECTION, PLUGIN_STORE_COLLECTION, TOPIC_COLLECTION, TYPE_JSON,
};
use crate::gate::{Category, Topic};
use crate::store::{MembershipStore, SettingsStore, TopicStore};
use crate::types::{GateError, Result};

/// All lockgate collections on one database
#[derive(Clone)]
pub struct MongoStore {
    categories: MongoCollection<CategoryDoc>,
    topics: MongoCollection<TopicDoc>,
    group_users: MongoCollection<GroupUserDoc>,
    plugin_store: MongoCollection<PluginStoreRowDoc>,
}

impl MongoStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            categories: client.collection(CATEGORY_COLLECTION).await?,
            topics: client.collection(TOPIC_COLLECTION).await?,
            group_users: client.collection(GROUP_USER_COLLECTION).await?,
            plugin_store: client.collection(PLUGIN_STORE_COLLECTION).await?,
        })
    }

    async fn hydrate(&self, row: TopicDoc) -> Result<Topic> {
        let category = match self
            .categories
            .find_one(doc! { "category_id": row.category_id })
            .await?
        {
            Some(category) => category.into_category(),
            None => {
                warn!(
                    topic_id = row.topic_id,
                    category_id = row.category_id,
                    "Topic references a missing category, treating as unlocked"
                );
                Category::new(row.category_id, "", "")
            }
        };

        Ok(Topic {
            id: row.topic_id,
            slug: row.slug,
            title: row.title,
            category,
            visible: row.visible,
        })
    }
}

#[async_trait]
impl TopicStore for MongoStore {
    async fn find_topic(&self, id: i64) -> Result<Option<Topic>> {
        match self.topics.find_one(doc! { "topic_id": id }).await? {
            Some(doc) => Ok(Some(self.hydrate(doc).await?)),
            None => Ok(None),
        }
    }

    async fn find_topic_by_slug(&self, slug: &str) -> Result<Option<Topic>> {
        // Lowest id wins when slugs collide
        let mut docs = self.topics.find_many(doc! { "slug": slug }).await?;
        docs.sort_by_key(|doc| doc.topic_id);
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(self.hydrate(doc).await?)),
            None => Ok(None),
        }
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .categories
            .find_many(doc! {})
            .await?
            .into_iter()
            .map(CategoryDoc::into_category)
            .collect();
        categories.sort_by_key(|category| category.id);
        Ok(categories)
    }
}

#[async_trait]
impl MembershipStore for MongoStore {
    async fn is_member(&self, user_id: i64, group: &str) -> Result<bool> {
        let row = self
            .group_users
            .find_one(doc! { "user_id": user_id, "group_name": group })
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl SettingsStore for MongoStore {
    async fn load(&self) -> Result<Option<LockSettings>> {
        let row = self
            .plugin_store
            .find_one(doc! { "plugin_name": PLUGIN_NAME, "key": SETTINGS_KEY })
            .await?;

        row.map(|row| {
            serde_json::from_str(&row.value).map_err(|e| {
                GateError::Database(format!("Corrupt settings row: {}", e))
            })
        })
        .transpose()
    }

    async fn save(&self, settings: &LockSettings) -> Result<()> {
        let value = serde_json::to_string(settings)
            .map_err(|e| GateError::Internal(format!("Failed to encode settings: {}", e)))?;

        self.plugin_store
            .upsert_one(
                doc! { "plugin_name": PLUGIN_NAME, "key": SETTINGS_KEY },
                touch_metadata(doc! { "type_name": TYPE_JSON, "value": value }),
            )
            .await?;
        Ok(())
    }
}
