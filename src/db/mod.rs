//! Database layer for lockgate
//!
//! MongoDB-backed implementations of the content, membership and settings
//! stores.

pub mod mongo;
pub mod schemas;
pub mod stores;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{CategoryDoc, GroupUserDoc, Metadata, PluginStoreRowDoc, TopicDoc};
pub use stores::MongoStore;
