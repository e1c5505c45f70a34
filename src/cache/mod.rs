//! Settings cache for lockgate
//!
//! ## Settings
//!
//! The plugin settings blob (lock network, default lock address and icon,
//! call-to-action text) is cached per process by [`ConfigCache`] and
//! repopulated from the durable store after an explicit clear.
//!
//! ## Invalidation
//!
//! The [`invalidation`] module fans clears out to every process over NATS so
//! an admin settings write is visible everywhere without a restart.

pub mod invalidation;
pub mod settings;

pub use invalidation::{
    clear_subject, spawn_invalidation_listener, InvalidationBus, InvalidationMessage,
    LocalInvalidation, NatsInvalidation,
};
pub use settings::{
    ClientLockSettings, ConfigCache, ConfigCacheStats, LockSettings, DEFAULT_NAMESPACE,
    PLUGIN_NAME, SETTINGS_KEY,
};
