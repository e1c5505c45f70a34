//! In-memory stores for dev mode and tests

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use super::{MembershipStore, SettingsStore, TopicStore};
use crate::cache::LockSettings;
use crate::gate::{Category, Topic};
use crate::types::{GateError, Result};

/// Topics, categories and group memberships held in memory
#[derive(Default)]
pub struct MemoryContentStore {
    categories: DashMap<i64, Category>,
    /// topic id -> (topic, category id); the category is re-read on lookup
    topics: DashMap<i64, (Topic, i64)>,
    memberships: DashSet<(i64, String)>,
    membership_queries: AtomicU64,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_category(&self, category: Category) {
        self.categories.insert(category.id, category);
    }

    /// Insert a topic; its category is registered too
    pub fn insert_topic(&self, topic: Topic) {
        let category_id = topic.category.id;
        self.categories
            .entry(category_id)
            .or_insert_with(|| topic.category.clone());
        self.topics.insert(topic.id, (topic, category_id));
    }

    pub fn add_member(&self, user_id: i64, group: &str) {
        self.memberships.insert((user_id, group.to_string()));
    }

    pub fn remove_member(&self, user_id: i64, group: &str) {
        self.memberships.remove(&(user_id, group.to_string()));
    }

    /// Number of membership queries served so far
    pub fn membership_queries(&self) -> u64 {
        self.membership_queries.load(Ordering::Relaxed)
    }

    /// Attach the current category to a stored topic
    fn hydrate(&self, stored: &(Topic, i64)) -> Topic {
        let (topic, category_id) = stored;
        let mut topic = topic.clone();
        if let Some(category) = self.categories.get(category_id) {
            topic.category = category.clone();
        }
        topic
    }
}

#[async_trait]
impl TopicStore for MemoryContentStore {
    async fn find_topic(&self, id: i64) -> Result<Option<Topic>> {
        Ok(self.topics.get(&id).map(|entry| self.hydrate(entry.value())))
    }

    async fn find_topic_by_slug(&self, slug: &str) -> Result<Option<Topic>> {
        let mut matches: Vec<Topic> = self
            .topics
            .iter()
            .filter(|entry| entry.value().0.slug == slug)
            .map(|entry| self.hydrate(entry.value()))
            .collect();
        matches.sort_by_key(|topic| topic.id);
        Ok(matches.into_iter().next())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .categories
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        categories.sort_by_key(|category| category.id);
        Ok(categories)
    }
}

#[async_trait]
impl MembershipStore for MemoryContentStore {
    async fn is_member(&self, user_id: i64, group: &str) -> Result<bool> {
        self.membership_queries.fetch_add(1, Ordering::Relaxed);
        Ok(self.memberships.contains(&(user_id, group.to_string())))
    }
}

/// Settings row held in memory
///
/// Counts loads so callers can observe cache behaviour; can be switched
/// offline to exercise store failures.
#[derive(Default)]
pub struct MemorySettingsStore {
    row: RwLock<Option<LockSettings>>,
    loads: AtomicU64,
    offline: AtomicBool,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: LockSettings) -> Self {
        let store = Self::default();
        store.put(settings);
        store
    }

    /// Write directly, bypassing any cache
    pub fn put(&self, settings: LockSettings) {
        if let Ok(mut row) = self.row.write() {
            *row = Some(settings);
        }
    }

    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(GateError::Database("settings store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<LockSettings>> {
        self.check_online()?;
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.row
            .read()
            .map(|row| row.clone())
            .map_err(|_| GateError::Internal("settings lock poisoned".into()))
    }

    async fn save(&self, settings: &LockSettings) -> Result<()> {
        self.check_online()?;
        let mut row = self
            .row
            .write()
            .map_err(|_| GateError::Internal("settings lock poisoned".into()))?;
        *row = Some(settings.clone());
        Ok(())
    }
}
