//! Byte sources for upload: scoped acquisition, guaranteed release.
//!
//! A [`ByteSource`] backs one candidate file (spooled upload, temp file).
//! The coordinator releases every processed source exactly once on every
//! exit path — validation failure, transfer failure, or success — so
//! temporary storage never leaks.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use planvault_core::StorageError;

/// A readable, releasable byte payload.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Read the full payload.
    async fn read(&self) -> Result<Vec<u8>, StorageError>;

    /// Release the underlying temporary storage. Idempotence is not
    /// required of implementations; the coordinator calls this exactly once.
    async fn release(&self);
}

/// In-memory byte source.
///
/// Used by tests and by callers that already hold the payload in memory.
/// Tracks release count so the cleanup invariant is observable.
#[derive(Debug)]
pub struct MemorySource {
    bytes: Vec<u8>,
    releases: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle observing how many times this source was released.
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn read(&self) -> Result<Vec<u8>, StorageError> {
        Ok(self.bytes.clone())
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
