//! Upload coordinator: validate, fan out per category, fan in, report.
//!
//! All validation happens before any backend call. Per-category uploads run
//! concurrently and share no mutable state; results are merged only after
//! every category finishes. A storage failure in one category never blocks
//! sibling categories, and partial success is always explicit in the
//! returned [`UploadOutcome`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use uuid::Uuid;

use planvault_core::{Error, StorageError, ValidationError};

use crate::category::{AssetCategory, TOTAL_PAYLOAD_CEILING_BYTES};
use crate::record::{AssetOwner, AssetRecord};
use crate::source::ByteSource;
use crate::store::{AssetCatalog, ObjectStore};

/// One candidate file for upload.
pub struct UploadFile {
    pub original_name: String,
    pub content_type: String,
    pub byte_size: u64,
    pub source: Box<dyn ByteSource>,
}

impl core::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UploadFile")
            .field("original_name", &self.original_name)
            .field("content_type", &self.content_type)
            .field("byte_size", &self.byte_size)
            .finish_non_exhaustive()
    }
}

/// An ordered list of candidate files for one category.
#[derive(Debug)]
pub struct CategoryBatch {
    pub category: AssetCategory,
    pub files: Vec<UploadFile>,
}

/// A category whose upload did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFailure {
    pub category: AssetCategory,
    pub error: Error,
}

/// Fan-in result of one coordinator invocation.
///
/// `orphaned_keys` lists objects that were written but are not cataloged
/// (a later file or the catalog append failed); they are reported here for
/// an out-of-band collection pass.
#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub completed: Vec<(AssetCategory, Vec<AssetRecord>)>,
    pub failures: Vec<CategoryFailure>,
    pub orphaned_keys: Vec<String>,
}

impl UploadOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.completed.iter().map(|(_, r)| r.len()).sum()
    }
}

/// Coordinates validation, storage transfer, and cataloging of one logical
/// entity's asset files.
pub struct UploadCoordinator {
    store: Arc<dyn ObjectStore>,
    catalog: Arc<dyn AssetCatalog>,
    max_put_attempts: u32,
    url_ttl: Duration,
}

impl UploadCoordinator {
    pub fn new(store: Arc<dyn ObjectStore>, catalog: Arc<dyn AssetCatalog>) -> Self {
        Self {
            store,
            catalog,
            max_put_attempts: 3,
            url_ttl: Duration::from_secs(60 * 60),
        }
    }

    pub fn with_max_put_attempts(mut self, attempts: u32) -> Self {
        self.max_put_attempts = attempts.max(1);
        self
    }

    pub fn with_url_ttl(mut self, ttl: Duration) -> Self {
        self.url_ttl = ttl;
        self
    }

    /// Validate and upload all category batches for `owner`.
    ///
    /// Validation failures are request-terminal: the whole invocation is
    /// rejected before any backend call and every byte source is released.
    /// Storage failures after validation are per-category and reported in
    /// the outcome.
    pub async fn upload(
        &self,
        owner: AssetOwner,
        batches: Vec<CategoryBatch>,
    ) -> Result<UploadOutcome, Error> {
        if let Err(err) = validate_batches(&batches) {
            release_all(batches).await;
            return Err(err.into());
        }

        let mut tasks: JoinSet<CategoryResult> = JoinSet::new();
        for batch in batches {
            let store = Arc::clone(&self.store);
            let catalog = Arc::clone(&self.catalog);
            let attempts = self.max_put_attempts;
            let ttl = self.url_ttl;
            tasks.spawn(async move {
                upload_category(owner, batch, store, catalog, attempts, ttl).await
            });
        }

        let mut outcome = UploadOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| Error::internal(format!("upload task panicked: {e}")))?;
            match result.error {
                None => outcome.completed.push((result.category, result.records)),
                Some(error) => {
                    tracing::warn!(
                        category = result.category.as_str(),
                        owner = %owner,
                        error = %error,
                        orphaned = result.orphaned_keys.len(),
                        "category upload failed"
                    );
                    outcome.failures.push(CategoryFailure {
                        category: result.category,
                        error,
                    });
                }
            }
            outcome.orphaned_keys.extend(result.orphaned_keys);
        }

        // Stable order for callers and logs: fan-in completion order is
        // nondeterministic.
        outcome.completed.sort_by_key(|(c, _)| c.as_str());
        outcome.failures.sort_by_key(|f| f.category.as_str());

        tracing::info!(
            owner = %owner,
            cataloged = outcome.record_count(),
            failed_categories = outcome.failures.len(),
            "upload batch finished"
        );
        Ok(outcome)
    }
}

struct CategoryResult {
    category: AssetCategory,
    records: Vec<AssetRecord>,
    orphaned_keys: Vec<String>,
    error: Option<Error>,
}

/// Enforce all per-category and batch-wide constraints before any upload.
fn validate_batches(batches: &[CategoryBatch]) -> Result<(), ValidationError> {
    let mut total_bytes: u64 = 0;

    for batch in batches {
        let rules = batch.category.rules();
        if batch.files.len() > rules.max_files {
            return Err(ValidationError::TooManyFiles {
                category: batch.category.as_str().to_string(),
                max: rules.max_files,
                got: batch.files.len(),
            });
        }
        for file in &batch.files {
            if !rules.allows_mime(&file.content_type) {
                return Err(ValidationError::DisallowedMime {
                    file: file.original_name.clone(),
                    mime: file.content_type.clone(),
                    category: batch.category.as_str().to_string(),
                });
            }
            total_bytes = total_bytes.saturating_add(file.byte_size);
        }
    }

    if total_bytes > TOTAL_PAYLOAD_CEILING_BYTES {
        return Err(ValidationError::PayloadTooLarge {
            got: total_bytes,
            max: TOTAL_PAYLOAD_CEILING_BYTES,
        });
    }

    Ok(())
}

async fn release_all(batches: Vec<CategoryBatch>) {
    for batch in batches {
        for file in batch.files {
            file.source.release().await;
        }
    }
}

/// Upload one category's files sequentially, then catalog them.
///
/// Every file's byte source is released exactly once, whether its transfer
/// succeeded, failed, or was skipped after an earlier failure.
async fn upload_category(
    owner: AssetOwner,
    batch: CategoryBatch,
    store: Arc<dyn ObjectStore>,
    catalog: Arc<dyn AssetCatalog>,
    max_put_attempts: u32,
    url_ttl: Duration,
) -> CategoryResult {
    let category = batch.category;
    let mut records = Vec::with_capacity(batch.files.len());
    let mut stored_keys = Vec::new();
    let mut failure: Option<Error> = None;

    let mut files = batch.files.into_iter();
    for file in files.by_ref() {
        let result = upload_file(
            owner,
            category,
            &file,
            store.as_ref(),
            max_put_attempts,
            url_ttl,
        )
        .await;
        file.source.release().await;

        match result {
            Ok(record) => {
                stored_keys.push(record.storage_key.clone());
                records.push(record);
            }
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }
    // Sources of files skipped after a failure still get released.
    for file in files {
        file.source.release().await;
    }

    if let Some(error) = failure {
        return CategoryResult {
            category,
            records: Vec::new(),
            orphaned_keys: stored_keys,
            error: Some(error),
        };
    }

    if let Err(err) = catalog
        .create_assets(owner, category, records.clone())
        .await
    {
        return CategoryResult {
            category,
            records: Vec::new(),
            orphaned_keys: stored_keys,
            error: Some(err.into()),
        };
    }

    CategoryResult {
        category,
        records,
        orphaned_keys: Vec::new(),
        error: None,
    }
}

async fn upload_file(
    owner: AssetOwner,
    category: AssetCategory,
    file: &UploadFile,
    store: &dyn ObjectStore,
    max_put_attempts: u32,
    url_ttl: Duration,
) -> Result<AssetRecord, Error> {
    let bytes = file.source.read().await.map_err(Error::from)?;
    let key = storage_key(owner, category, &file.original_name);

    let mut last_err: Option<StorageError> = None;
    let mut stored_key = None;
    for attempt in 1..=max_put_attempts {
        match store.put(&key, bytes.clone(), &file.content_type).await {
            Ok(k) => {
                stored_key = Some(k);
                break;
            }
            Err(err) => {
                tracing::debug!(
                    key = %key,
                    attempt,
                    max_put_attempts,
                    error = %err,
                    "object put failed"
                );
                last_err = Some(err);
                if attempt < max_put_attempts {
                    tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
                }
            }
        }
    }
    let Some(stored_key) = stored_key else {
        // max_put_attempts >= 1, so last_err is set here.
        return Err(last_err
            .map(Error::from)
            .unwrap_or_else(|| Error::internal("put failed with no attempts")));
    };

    let url = store.signed_url(&stored_key, url_ttl).await.map_err(Error::from)?;

    Ok(AssetRecord {
        id: planvault_core::AssetId::new(),
        display_name: file.original_name.clone(),
        storage_key: stored_key,
        url,
        byte_size: bytes.len() as u64,
        content_type: file.content_type.clone(),
        category,
        owner,
        uploaded_at: chrono::Utc::now(),
    })
}

/// Globally unique storage key: owner scope + category + random component,
/// collision-free under concurrent uploads for the same entity.
fn storage_key(owner: AssetOwner, category: AssetCategory, original_name: &str) -> String {
    let owner_id = match owner {
        AssetOwner::Plan(id) => id.to_string(),
        AssetOwner::Order(id) => id.to_string(),
    };
    format!(
        "{}/{}/{}/{}-{}",
        owner.kind(),
        owner_id,
        category,
        Uuid::now_v7(),
        sanitize_name(original_name)
    )
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Object store double: counts calls, optionally fails puts per key.
    #[derive(Default)]
    struct FakeStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        put_calls: AtomicUsize,
        // substring of keys whose puts always fail
        fail_puts_matching: Option<String>,
    }

    impl FakeStore {
        fn failing(substr: &str) -> Self {
            Self {
                fail_puts_matching: Some(substr.to_string()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn put(
            &self,
            key: &str,
            bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, StorageError> {
            self.put_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(pat) = &self.fail_puts_matching {
                if key.contains(pat.as_str()) {
                    return Err(StorageError::Put {
                        key: key.to_string(),
                        reason: "injected".into(),
                    });
                }
            }
            self.objects.lock().unwrap().insert(key.to_string(), bytes);
            Ok(key.to_string())
        }

        async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::Get {
                    key: key.to_string(),
                    reason: "missing".into(),
                })
        }

        async fn signed_url(&self, key: &str, _ttl: Duration) -> Result<String, StorageError> {
            Ok(format!("https://store.test/{key}?sig=abc"))
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeCatalog {
        rows: Mutex<Vec<AssetRecord>>,
    }

    #[async_trait]
    impl AssetCatalog for FakeCatalog {
        async fn list_assets(
            &self,
            owner: AssetOwner,
        ) -> Result<Vec<AssetRecord>, StorageError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.owner == owner)
                .cloned()
                .collect())
        }

        async fn create_assets(
            &self,
            _owner: AssetOwner,
            _category: AssetCategory,
            records: Vec<AssetRecord>,
        ) -> Result<(), StorageError> {
            self.rows.lock().unwrap().extend(records);
            Ok(())
        }
    }

    fn file(name: &str, mime: &str, bytes: &[u8]) -> (UploadFile, Arc<AtomicUsize>) {
        let source = MemorySource::new(bytes.to_vec());
        let counter = source.release_counter();
        (
            UploadFile {
                original_name: name.to_string(),
                content_type: mime.to_string(),
                byte_size: bytes.len() as u64,
                source: Box::new(source),
            },
            counter,
        )
    }

    fn coordinator(store: Arc<FakeStore>, catalog: Arc<FakeCatalog>) -> UploadCoordinator {
        UploadCoordinator::new(store, catalog).with_max_put_attempts(2)
    }

    #[tokio::test]
    async fn uploads_and_catalogs_all_categories() {
        let store = Arc::new(FakeStore::default());
        let catalog = Arc::new(FakeCatalog::default());
        let owner = AssetOwner::Order(planvault_core::OrderId::new());

        let (pdf, pdf_rel) = file("plan.pdf", "application/pdf", b"%PDF-1.7");
        let (render, render_rel) = file("front.png", "image/png", b"\x89PNG");

        let outcome = coordinator(Arc::clone(&store), Arc::clone(&catalog))
            .upload(
                owner,
                vec![
                    CategoryBatch {
                        category: AssetCategory::Pdf,
                        files: vec![pdf],
                    },
                    CategoryBatch {
                        category: AssetCategory::Render,
                        files: vec![render],
                    },
                ],
            )
            .await
            .unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.record_count(), 2);
        assert!(outcome.orphaned_keys.is_empty());
        assert_eq!(catalog.list_assets(owner).await.unwrap().len(), 2);
        assert_eq!(pdf_rel.load(Ordering::SeqCst), 1);
        assert_eq!(render_rel.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disallowed_mime_rejects_without_backend_call() {
        let store = Arc::new(FakeStore::default());
        let catalog = Arc::new(FakeCatalog::default());
        let owner = AssetOwner::Order(planvault_core::OrderId::new());

        let (bad, bad_rel) = file("notes.txt", "text/plain", b"not cad");
        let err = coordinator(Arc::clone(&store), Arc::clone(&catalog))
            .upload(
                owner,
                vec![CategoryBatch {
                    category: AssetCategory::Cad,
                    files: vec![bad],
                }],
            )
            .await
            .unwrap_err();

        match err {
            Error::Validation(ValidationError::DisallowedMime { file, category, .. }) => {
                assert_eq!(file, "notes.txt");
                assert_eq!(category, "cad");
            }
            other => panic!("expected DisallowedMime, got {other:?}"),
        }
        assert_eq!(store.put_calls.load(Ordering::SeqCst), 0);
        assert!(catalog.list_assets(owner).await.unwrap().is_empty());
        assert_eq!(bad_rel.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_category_does_not_block_siblings() {
        // Render keys fail; pdf succeeds.
        let store = Arc::new(FakeStore::failing("/render/"));
        let catalog = Arc::new(FakeCatalog::default());
        let owner = AssetOwner::Order(planvault_core::OrderId::new());

        let (pdf, _) = file("plan.pdf", "application/pdf", b"%PDF-1.7");
        let (render, render_rel) = file("front.png", "image/png", b"\x89PNG");

        let outcome = coordinator(Arc::clone(&store), Arc::clone(&catalog))
            .upload(
                owner,
                vec![
                    CategoryBatch {
                        category: AssetCategory::Pdf,
                        files: vec![pdf],
                    },
                    CategoryBatch {
                        category: AssetCategory::Render,
                        files: vec![render],
                    },
                ],
            )
            .await
            .unwrap();

        assert!(!outcome.is_complete());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].category, AssetCategory::Render);
        assert_eq!(outcome.record_count(), 1);
        // Failed source still released exactly once.
        assert_eq!(render_rel.load(Ordering::SeqCst), 1);
        // Puts for the failing key were retried (2 attempts) and only the
        // sibling succeeded.
        assert_eq!(store.put_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn earlier_keys_reported_orphaned_when_category_fails_midway() {
        let store = Arc::new(FakeStore::failing("broken"));
        let catalog = Arc::new(FakeCatalog::default());
        let owner = AssetOwner::Plan(planvault_core::PlanId::new());

        let (ok, ok_rel) = file("front.png", "image/png", b"a");
        let (bad, bad_rel) = file("broken.png", "image/png", b"b");
        let (skipped, skipped_rel) = file("side.png", "image/png", b"c");

        let outcome = coordinator(Arc::clone(&store), Arc::clone(&catalog))
            .upload(
                owner,
                vec![CategoryBatch {
                    category: AssetCategory::Render,
                    files: vec![ok, bad, skipped],
                }],
            )
            .await
            .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.record_count(), 0);
        assert_eq!(outcome.orphaned_keys.len(), 1);
        assert!(outcome.orphaned_keys[0].contains("front.png"));
        // Nothing cataloged for a failed category.
        assert!(catalog.list_assets(owner).await.unwrap().is_empty());
        // Every source released exactly once, including the skipped one.
        for rel in [ok_rel, bad_rel, skipped_rel] {
            assert_eq!(rel.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn too_many_files_is_rejected_upfront() {
        let store = Arc::new(FakeStore::default());
        let catalog = Arc::new(FakeCatalog::default());
        let owner = AssetOwner::Order(planvault_core::OrderId::new());

        let files: Vec<UploadFile> = (0..11)
            .map(|i| file(&format!("f{i}.pdf"), "application/pdf", b"x").0)
            .collect();

        let err = coordinator(Arc::clone(&store), catalog)
            .upload(
                owner,
                vec![CategoryBatch {
                    category: AssetCategory::Pdf,
                    files,
                }],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::TooManyFiles { .. })
        ));
        assert_eq!(store.put_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn payload_ceiling_is_enforced() {
        let store = Arc::new(FakeStore::default());
        let catalog = Arc::new(FakeCatalog::default());
        let owner = AssetOwner::Order(planvault_core::OrderId::new());

        // Declared size is what is validated; actual bytes stay small.
        let source = MemorySource::new(b"tiny".to_vec());
        let huge = UploadFile {
            original_name: "huge.pdf".into(),
            content_type: "application/pdf".into(),
            byte_size: TOTAL_PAYLOAD_CEILING_BYTES + 1,
            source: Box::new(source),
        };

        let err = coordinator(store, catalog)
            .upload(
                owner,
                vec![CategoryBatch {
                    category: AssetCategory::Pdf,
                    files: vec![huge],
                }],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn storage_keys_are_scoped_and_sanitized() {
        let owner = AssetOwner::Order(planvault_core::OrderId::new());
        let key = storage_key(owner, AssetCategory::Cad, "main floor (v2).dwg");
        assert!(key.starts_with("order/"));
        assert!(key.contains("/cad/"));
        assert!(key.ends_with("main-floor--v2-.dwg"));

        let a = storage_key(owner, AssetCategory::Cad, "same.dwg");
        let b = storage_key(owner, AssetCategory::Cad, "same.dwg");
        assert_ne!(a, b);
    }
}
