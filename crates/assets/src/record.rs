//! Cataloged asset records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planvault_core::{AssetId, Entity, OrderId, PlanId};

use crate::category::AssetCategory;

/// Owning entity of an asset: a plan template or a specific order.
///
/// Mutually exclusive by construction. Asset lifecycle is independent of the
/// owner's lifecycle — the owner holds a weak (lookup-only) reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum AssetOwner {
    Plan(PlanId),
    Order(OrderId),
}

impl AssetOwner {
    pub fn kind(&self) -> &'static str {
        match self {
            AssetOwner::Plan(_) => "plan",
            AssetOwner::Order(_) => "order",
        }
    }
}

impl core::fmt::Display for AssetOwner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AssetOwner::Plan(id) => write!(f, "plan/{id}"),
            AssetOwner::Order(id) => write!(f, "order/{id}"),
        }
    }
}

/// One stored digital file, cataloged with metadata and a retrieval URL.
///
/// Created exclusively by the upload coordinator; never mutated after
/// creation; deleted only by explicit administrative action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    pub display_name: String,
    pub storage_key: String,
    pub url: String,
    pub byte_size: u64,
    pub content_type: String,
    pub category: AssetCategory,
    pub owner: AssetOwner,
    pub uploaded_at: DateTime<Utc>,
}

impl Entity for AssetRecord {
    type Id = AssetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
