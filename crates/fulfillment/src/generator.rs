//! Asset generation for a paid order.
//!
//! The catalog holds template assets owned by each plan; fulfilling an
//! order copies those templates into order-owned keys through the upload
//! coordinator, so the customer's retrieval URLs never point into the
//! shared template space.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use planvault_assets::{
    AssetOwner, CategoryBatch, MemorySource, ObjectStore, UploadCoordinator, UploadFile,
    UploadOutcome,
};
use planvault_assets::AssetCatalog;
use planvault_core::Error;
use planvault_orders::Order;

/// Produces and catalogs the deliverable assets for one order.
#[async_trait]
pub trait AssetGenerator: Send + Sync {
    async fn generate(&self, order: &Order) -> Result<UploadOutcome, Error>;
}

/// Default generator: copies each purchased plan's template assets into
/// order-owned storage.
pub struct PlanPackageGenerator {
    store: Arc<dyn ObjectStore>,
    catalog: Arc<dyn AssetCatalog>,
    coordinator: UploadCoordinator,
}

impl PlanPackageGenerator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        catalog: Arc<dyn AssetCatalog>,
        coordinator: UploadCoordinator,
    ) -> Self {
        Self {
            store,
            catalog,
            coordinator,
        }
    }
}

#[async_trait]
impl AssetGenerator for PlanPackageGenerator {
    async fn generate(&self, order: &Order) -> Result<UploadOutcome, Error> {
        // Group template files by category across all purchased plans so the
        // coordinator sees one batch per category.
        let mut by_category: BTreeMap<&'static str, CategoryBatch> = BTreeMap::new();

        for item in &order.items {
            let templates = self
                .catalog
                .list_assets(AssetOwner::Plan(item.plan_id))
                .await
                .map_err(Error::from)?;

            if templates.is_empty() {
                tracing::warn!(
                    plan_id = %item.plan_id,
                    order_id = %order.id,
                    "plan has no template assets to deliver"
                );
            }

            for template in templates {
                let bytes = self
                    .store
                    .get(&template.storage_key)
                    .await
                    .map_err(Error::from)?;
                let file = UploadFile {
                    original_name: template.display_name.clone(),
                    content_type: template.content_type.clone(),
                    byte_size: bytes.len() as u64,
                    source: Box::new(MemorySource::new(bytes)),
                };
                by_category
                    .entry(template.category.as_str())
                    .or_insert_with(|| CategoryBatch {
                        category: template.category,
                        files: Vec::new(),
                    })
                    .files
                    .push(file);
            }
        }

        let batches: Vec<CategoryBatch> = by_category.into_values().collect();
        self.coordinator
            .upload(AssetOwner::Order(order.id), batches)
            .await
    }
}
