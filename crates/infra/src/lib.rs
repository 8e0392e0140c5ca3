//! `planvault-infra` — concrete backends for the consumed interfaces.
//!
//! In-memory implementations of the object store, record stores, and asset
//! catalog. Intended for dev/test; a production deployment swaps these for
//! real backends behind the same traits.

pub mod object_store;
pub mod record_store;

pub use object_store::InMemoryObjectStore;
pub use record_store::{InMemoryAssetCatalog, InMemoryOrderStore, InMemoryPaymentStore};
