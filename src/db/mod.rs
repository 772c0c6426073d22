pub mod redis;
use async_trait::async_trait;
use std::sync::Arc;
use std::path::Path;
use log::{ info, warn };

use crate::error::IndexError;
use crate::schema::{ Schema, SchemaFile };

#[async_trait]
pub trait IndexStore: Send + Sync {
    async fn create_index(&self, index_name: &str, schema: &Schema) -> Result<(), IndexError>;

    async fn drop_index(&self, index_name: &str, delete_documents: bool) -> Result<(), IndexError>;

    async fn list_indexes(&self) -> Result<Vec<String>, IndexError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreType {
    Redis,
}

#[derive(Clone, Debug)]
pub struct IndexStoreConfig {
    pub store_type: StoreType,
    pub host: String,
}

pub fn create_index_store(config: IndexStoreConfig) -> Result<Arc<dyn IndexStore>, IndexError> {
    info!("Creating index store of type: {:?}", config.store_type);
    match config.store_type {
        StoreType::Redis => {
            let store = redis::RedisIndexStore::new(&config.host)?;
            Ok(Arc::new(store))
        }
    }
}

pub fn get_store_type(type_str: &str) -> Result<StoreType, IndexError> {
    match type_str.to_lowercase().as_str() {
        "redis" | "redisearch" => Ok(StoreType::Redis),
        _ => Err(IndexError::UnsupportedStore(type_str.to_string())),
    }
}

/// Creates every index declared in the schema file at `path`, in file order.
/// Stops at the first index the store rejects.
pub async fn create_indexes_from_file(
    store: &dyn IndexStore,
    path: impl AsRef<Path>
) -> Result<Vec<String>, IndexError> {
    let file = SchemaFile::load(path)?;
    if file.indexes.is_empty() {
        warn!("Schema file declares no indexes. Nothing to create.");
    }
    let mut created = Vec::with_capacity(file.indexes.len());
    for index in &file.indexes {
        store.create_index(&index.name, &index.to_schema()).await?;
        created.push(index.name.clone());
    }
    info!("Created {} indexes from schema file", created.len());
    Ok(created)
}
