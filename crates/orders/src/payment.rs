//! Payment records: the order's embedded payment sub-record and the
//! standalone per-attempt row keyed by the provider checkout id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planvault_core::{CheckoutId, Entity, OrderId};

use crate::status::PaymentStatus;

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    MobileMoney,
    BankTransfer,
}

/// Payment sub-record embedded in an [`crate::Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub checkout_id: CheckoutId,
    /// Provider transaction id, set once the provider confirms the charge.
    pub provider_txn_id: Option<String>,
    pub status: PaymentStatus,
}

/// One row per payment attempt.
///
/// Created when a payment attempt starts; mutated only by the webhook →
/// fulfillment path (via compare-and-set in the record store). Immutable
/// once the status leaves `pending`, except for administrative correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub checkout_id: CheckoutId,
    pub order_id: OrderId,
    pub amount_cents: u64,
    pub phone: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(checkout_id: CheckoutId, order_id: OrderId, amount_cents: u64) -> Self {
        let now = Utc::now();
        Self {
            checkout_id,
            order_id,
            amount_cents,
            phone: None,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Payment {
    type Id = CheckoutId;

    fn id(&self) -> &Self::Id {
        &self.checkout_id
    }
}
