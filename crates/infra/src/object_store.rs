//! In-memory object store.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use planvault_assets::ObjectStore;
use planvault_core::StorageError;

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    #[allow(dead_code)]
    content_type: String,
}

/// In-memory object store with atomic per-key writes.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(key.to_string())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
        objects
            .get(key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StorageError::Get {
                key: key.to_string(),
                reason: "no such object".into(),
            })
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        {
            let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
            if !objects.contains_key(key) {
                return Err(StorageError::Sign {
                    key: key.to_string(),
                    reason: "no such object".into(),
                });
            }
        }
        // Shape mirrors a pre-signed URL; the signature is not meaningful.
        Ok(format!(
            "https://storage.local/{key}?expires={}&sig=dev",
            ttl.as_secs()
        ))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        objects.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = InMemoryObjectStore::new();
        store
            .put("order/1/pdf/plan.pdf", b"%PDF".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert_eq!(store.get("order/1/pdf/plan.pdf").await.unwrap(), b"%PDF");

        store.delete("order/1/pdf/plan.pdf").await.unwrap();
        assert!(store.get("order/1/pdf/plan.pdf").await.is_err());
    }

    #[tokio::test]
    async fn signing_requires_an_existing_object() {
        let store = InMemoryObjectStore::new();
        assert!(store
            .signed_url("missing", Duration::from_secs(60))
            .await
            .is_err());

        store.put("k", b"x".to_vec(), "text/plain").await.unwrap();
        let url = store.signed_url("k", Duration::from_secs(60)).await.unwrap();
        assert!(url.contains("k?expires=60"));
    }
}
