//! Plugin settings blob and its process-wide cache
//!
//! Settings are read on every initial page load but written rarely (only
//! through the admin settings route). The cache memoizes the durable row
//! until `clear()`; `clear()` also fans out to other processes through the
//! configured [`InvalidationBus`].

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::invalidation::InvalidationBus;
use crate::store::SettingsStore;
use crate::types::Result;

/// Plugin store namespace for the settings row
pub const PLUGIN_NAME: &str = "unlocked";
/// Key of the settings row (and of its cache entry)
pub const SETTINGS_KEY: &str = "settings";
/// Default cache namespace
pub const DEFAULT_NAMESPACE: &str = "unlock";

/// Typed settings blob
///
/// The four named fields are what clients receive; anything else an admin
/// stores is kept in `extra` and round-trips through the store untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_call_to_action: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Whitelisted subset of [`LockSettings`] exposed to browsers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientLockSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_call_to_action: Option<String>,
}

impl LockSettings {
    pub fn client_view(&self) -> ClientLockSettings {
        ClientLockSettings {
            lock_network: self.lock_network.clone(),
            lock_address: self.lock_address.clone(),
            lock_icon: self.lock_icon.clone(),
            lock_call_to_action: self.lock_call_to_action.clone(),
        }
    }
}

/// A memoized read of the settings row; `None` when the row does not exist
type CachedRow = Option<Arc<LockSettings>>;

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct ConfigCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub clears: u64,
}

/// Process-wide settings cache
///
/// Constructed once at startup and shared through `Arc`. Concurrent misses
/// may each read the store; every reader sees either the previous value or a
/// freshly loaded one.
pub struct ConfigCache {
    namespace: String,
    entries: DashMap<String, CachedRow>,
    store: Arc<dyn SettingsStore>,
    bus: Arc<dyn InvalidationBus>,
    /// Bumped on every clear; loads that straddle a clear are not memoized
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    clears: AtomicU64,
}

impl ConfigCache {
    pub fn new(
        namespace: impl Into<String>,
        store: Arc<dyn SettingsStore>,
        bus: Arc<dyn InvalidationBus>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            entries: DashMap::new(),
            store,
            bus,
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            clears: AtomicU64::new(0),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Current settings, `None` if the row was never written
    pub async fn persisted(&self) -> Result<Option<Arc<LockSettings>>> {
        if let Some(entry) = self.entries.get(SETTINGS_KEY) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(namespace = %self.namespace, "Settings cache hit");
            return Ok(entry.value().clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(namespace = %self.namespace, "Settings cache miss");

        let generation = self.generation.load(Ordering::Acquire);
        let loaded: CachedRow = self.store.load().await?.map(Arc::new);

        {
            // Holding the shard entry serializes us against clear_local()
            let entry = self.entries.entry(SETTINGS_KEY.to_string());
            if self.generation.load(Ordering::Acquire) == generation {
                entry.or_insert_with(|| loaded.clone());
            } else {
                debug!(namespace = %self.namespace, "Settings cleared during load, not memoizing");
            }
        }

        Ok(loaded)
    }

    /// Current settings, empty when the row was never written
    pub async fn settings(&self) -> Result<Arc<LockSettings>> {
        Ok(self.persisted().await?.unwrap_or_default())
    }

    /// Evict the local entries and notify other processes
    pub async fn clear(&self) -> Result<()> {
        self.clear_local();
        self.bus.publish_clear(&self.namespace).await
    }

    /// Evict the local entries only
    pub fn clear_local(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.clear();
        self.clears.fetch_add(1, Ordering::Relaxed);
        info!(namespace = %self.namespace, "Settings cache cleared");
    }

    pub fn stats(&self) -> ConfigCacheStats {
        ConfigCacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::invalidation::LocalInvalidation;
    use crate::store::MemorySettingsStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn settings(address: &str) -> LockSettings {
        LockSettings {
            lock_network: Some("4".into()),
            lock_address: Some(address.into()),
            lock_icon: None,
            lock_call_to_action: Some("Join to read".into()),
            extra: BTreeMap::new(),
        }
    }

    fn cache_over(store: &Arc<MemorySettingsStore>) -> ConfigCache {
        ConfigCache::new(
            DEFAULT_NAMESPACE,
            Arc::clone(store) as Arc<dyn SettingsStore>,
            Arc::new(LocalInvalidation),
        )
    }

    #[tokio::test]
    async fn test_get_is_memoized() {
        let store = Arc::new(MemorySettingsStore::with_settings(settings("0xABC")));
        let cache = cache_over(&store);

        let first = cache.settings().await.unwrap();
        let second = cache.settings().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.loads(), 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn test_missing_row_is_memoized_as_absent() {
        let store = Arc::new(MemorySettingsStore::new());
        let cache = cache_over(&store);

        assert!(cache.persisted().await.unwrap().is_none());
        assert_eq!(*cache.settings().await.unwrap(), LockSettings::default());
        assert_eq!(store.loads(), 1);
    }

    #[tokio::test]
    async fn test_clear_observes_new_writes() {
        let store = Arc::new(MemorySettingsStore::with_settings(settings("0xABC")));
        let cache = cache_over(&store);

        assert_eq!(cache.settings().await.unwrap().lock_address.as_deref(), Some("0xABC"));

        store.put(settings("0xDEF"));
        // Still memoized
        assert_eq!(cache.settings().await.unwrap().lock_address.as_deref(), Some("0xABC"));

        cache.clear().await.unwrap();
        assert_eq!(cache.settings().await.unwrap().lock_address.as_deref(), Some("0xDEF"));
        assert_eq!(store.loads(), 2);
        assert_eq!(cache.stats().clears, 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_memoized() {
        let store = Arc::new(MemorySettingsStore::with_settings(settings("0xABC")));
        let cache = cache_over(&store);

        store.set_offline(true);
        assert!(cache.settings().await.unwrap_err().is_infrastructure());

        store.set_offline(false);
        assert!(cache.settings().await.is_ok());
        assert_eq!(cache.stats().entries, 1);
    }

    /// Store that clears the cache in the middle of a load
    struct ClearingStore {
        cache: Mutex<Option<Arc<ConfigCache>>>,
        inner: MemorySettingsStore,
    }

    #[async_trait]
    impl SettingsStore for ClearingStore {
        async fn load(&self) -> Result<Option<LockSettings>> {
            let loaded = self.inner.load().await;
            let cache = self.cache.lock().unwrap().take();
            if let Some(cache) = cache {
                cache.clear_local();
            }
            loaded
        }

        async fn save(&self, settings: &LockSettings) -> Result<()> {
            self.inner.save(settings).await
        }
    }

    #[tokio::test]
    async fn test_load_racing_clear_is_not_memoized() {
        let store = Arc::new(ClearingStore {
            cache: Mutex::new(None),
            inner: MemorySettingsStore::with_settings(settings("0xABC")),
        });
        let cache = Arc::new(ConfigCache::new(
            DEFAULT_NAMESPACE,
            Arc::clone(&store) as Arc<dyn SettingsStore>,
            Arc::new(LocalInvalidation),
        ));
        *store.cache.lock().unwrap() = Some(Arc::clone(&cache));

        // The caller still gets the value it read
        assert!(cache.persisted().await.unwrap().is_some());
        assert_eq!(cache.stats().entries, 0);

        // Next read repopulates
        cache.persisted().await.unwrap();
        assert_eq!(cache.stats().entries, 1);
        assert_eq!(store.inner.loads(), 2);
    }

    #[test]
    fn test_settings_round_trip_keeps_extras() {
        let json = r#"{"lock_network":"1","lock_address":"0xABC","theme":"dark"}"#;
        let parsed: LockSettings = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.lock_address.as_deref(), Some("0xABC"));
        assert_eq!(parsed.extra.get("theme"), Some(&serde_json::json!("dark")));

        let client = serde_json::to_value(parsed.client_view()).unwrap();
        assert_eq!(
            client,
            serde_json::json!({"lock_network": "1", "lock_address": "0xABC"})
        );
    }
}
