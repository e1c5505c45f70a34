//! MongoDB client and collection wrapper

use bson::{doc, DateTime, Document};
use mongodb::{
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use futures_util::{Stream, TryStreamExt};
use std::fmt::Display;
use tracing::info;

use crate::types::GateError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, GateError> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| GateError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| GateError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, GateError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, GateError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), GateError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| GateError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Find one document by filter, skipping soft-deleted rows
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, GateError> {
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        self.inner
            .find_one(full_filter)
            .await
            .map_err(|e| GateError::Database(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter, skipping soft-deleted rows
    ///
    /// A row that fails to decode fails the whole read.
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, GateError> {
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        let cursor = self
            .inner
            .find(full_filter)
            .await
            .map_err(|e| GateError::Database(format!("Find failed: {}", e)))?;

        collect_rows(cursor).await
    }

    /// Update one document, inserting it when no row matches
    pub async fn upsert_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, GateError> {
        self.inner
            .update_one(filter, update.into())
            .upsert(true)
            .await
            .map_err(|e| GateError::Database(format!("Upsert failed: {}", e)))
    }
}

/// Drain a cursor, failing on the first row that cannot be read
pub async fn collect_rows<S, T, E>(rows: S) -> Result<Vec<T>, GateError>
where
    S: Stream<Item = Result<T, E>>,
    E: Display,
{
    rows.map_err(|e| GateError::Database(format!("Failed to read documents: {}", e)))
        .try_collect()
        .await
}

/// `$set` document stamping `metadata.updated_at`, with `created_at` on insert
pub fn touch_metadata(mut set: Document) -> Document {
    set.insert("metadata.updated_at", DateTime::now());
    set.insert("metadata.is_deleted", false);
    doc! {
        "$set": set,
        "$setOnInsert": { "metadata.created_at": DateTime::now() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_metadata_shapes_update() {
        let update = touch_metadata(doc! { "value": "{}" });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("value").unwrap(), "{}");
        assert!(set.get_datetime("metadata.updated_at").is_ok());
        assert!(!set.get_bool("metadata.is_deleted").unwrap());
        assert!(update
            .get_document("$setOnInsert")
            .unwrap()
            .contains_key("metadata.created_at"));
    }

    #[tokio::test]
    async fn test_unreadable_row_fails_the_read() {
        let rows = futures_util::stream::iter(vec![
            Err("invalid type: string, expected i64"),
            Ok(11_i64),
        ]);
        let err = collect_rows(rows).await.unwrap_err();
        assert!(matches!(err, GateError::Database(_)));
        assert!(err.is_infrastructure());

        let rows = futures_util::stream::iter(vec![Ok::<_, &str>(10_i64), Ok(11)]);
        assert_eq!(collect_rows(rows).await.unwrap(), vec![10, 11]);
    }
}
