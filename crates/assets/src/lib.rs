//! `planvault-assets` — asset catalog types and the upload coordinator.
//!
//! Validates purchase assets against fixed per-category rules, transfers
//! them to the object store with bounded retry, and reports partial success
//! explicitly. The store and catalog are consumed through traits; concrete
//! backends live in `planvault-infra`.

pub mod category;
pub mod coordinator;
pub mod record;
pub mod source;
pub mod store;

pub use category::{AssetCategory, CategoryRules, TOTAL_PAYLOAD_CEILING_BYTES};
pub use coordinator::{
    CategoryBatch, CategoryFailure, UploadCoordinator, UploadFile, UploadOutcome,
};
pub use record::{AssetOwner, AssetRecord};
pub use source::{ByteSource, MemorySource};
pub use store::{AssetCatalog, ObjectStore};
