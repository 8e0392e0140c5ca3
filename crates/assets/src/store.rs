//! Consumed interfaces: durable object store and asset catalog.
//!
//! In-memory implementations for dev/test live in `planvault-infra`.

use std::time::Duration;

use async_trait::async_trait;

use planvault_core::StorageError;

use crate::category::AssetCategory;
use crate::record::{AssetOwner, AssetRecord};

/// Durable object store with atomic per-key writes and time-limited
/// retrieval URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, returning the key actually written.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
    -> Result<String, StorageError>;

    /// Fetch the object at `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Mint a time-limited retrieval URL for `key`.
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Delete the object at `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Catalog of asset records, indexed by owner and category.
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    async fn list_assets(&self, owner: AssetOwner) -> Result<Vec<AssetRecord>, StorageError>;

    async fn create_assets(
        &self,
        owner: AssetOwner,
        category: AssetCategory,
        records: Vec<AssetRecord>,
    ) -> Result<(), StorageError>;
}
