//! Order record: customer, line items, payment sub-record, totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planvault_core::{Entity, OrderId, PlanId, UserId, ValidationError};

use crate::payment::PaymentInfo;
use crate::status::OrderStatus;

/// Customer contact information captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// One ordered line: plan reference, display name, unit price, quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub plan_id: PlanId,
    pub name: String,
    /// Price in smallest currency unit (cents).
    pub unit_price_cents: u64,
    pub quantity: u32,
}

impl LineItem {
    pub fn line_total_cents(&self) -> u64 {
        self.unit_price_cents * u64::from(self.quantity)
    }
}

/// Computed order totals, all in cents.
///
/// Invariant: `total == subtotal + tax + shipping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal_cents: u64,
    pub tax_cents: u64,
    pub shipping_cents: u64,
    pub total_cents: u64,
}

impl OrderTotals {
    /// Build totals from components; the invariant holds by construction.
    pub fn from_parts(subtotal_cents: u64, tax_cents: u64, shipping_cents: u64) -> Self {
        Self {
            subtotal_cents,
            tax_cents,
            shipping_cents,
            total_cents: subtotal_cents + tax_cents + shipping_cents,
        }
    }

    /// Re-check the invariant on totals that crossed a serialization
    /// boundary (record store, wire).
    pub fn validate(&self) -> Result<(), ValidationError> {
        let expected = self.subtotal_cents + self.tax_cents + self.shipping_cents;
        if self.total_cents != expected {
            return Err(ValidationError::InvalidTotals(format!(
                "total {} != subtotal {} + tax {} + shipping {}",
                self.total_cents, self.subtotal_cents, self.tax_cents, self.shipping_cents
            )));
        }
        Ok(())
    }
}

/// A customer purchase of one or more house-plan packages.
///
/// Created at checkout initiation (outside this core), mutated only by the
/// fulfillment service and administrative override. Never deleted —
/// cancellation and refund are status values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub customer: CustomerInfo,
    pub items: Vec<LineItem>,
    pub payment: PaymentInfo,
    pub status: OrderStatus,
    pub totals: OrderTotals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Validate record-level invariants (totals consistency and a subtotal
    /// that matches the line items).
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.totals.validate()?;
        let line_sum: u64 = self.items.iter().map(LineItem::line_total_cents).sum();
        if line_sum != self.totals.subtotal_cents {
            return Err(ValidationError::InvalidTotals(format!(
                "subtotal {} does not match line items sum {}",
                self.totals.subtotal_cents, line_sum
            )));
        }
        Ok(())
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.customer_id == user_id
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentMethod;
    use crate::status::PaymentStatus;
    use planvault_core::CheckoutId;
    use proptest::prelude::*;

    fn test_order(totals: OrderTotals, items: Vec<LineItem>) -> Order {
        Order {
            id: OrderId::new(),
            customer_id: UserId::new(),
            customer: CustomerInfo {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                phone: None,
            },
            items,
            payment: PaymentInfo {
                method: PaymentMethod::Card,
                checkout_id: CheckoutId::new("cs_1"),
                provider_txn_id: None,
                status: PaymentStatus::Pending,
            },
            status: OrderStatus::Pending,
            totals,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn totals_from_parts_satisfy_invariant() {
        let totals = OrderTotals::from_parts(10_000, 800, 0);
        assert_eq!(totals.total_cents, 10_800);
        totals.validate().unwrap();
    }

    #[test]
    fn tampered_total_fails_validation() {
        let mut totals = OrderTotals::from_parts(10_000, 800, 0);
        totals.total_cents += 1;
        assert!(totals.validate().is_err());
    }

    #[test]
    fn subtotal_must_match_line_items() {
        let items = vec![LineItem {
            plan_id: PlanId::new(),
            name: "Craftsman 2400".into(),
            unit_price_cents: 5_000,
            quantity: 2,
        }];
        let order = test_order(OrderTotals::from_parts(10_000, 0, 0), items.clone());
        order.validate().unwrap();

        let bad = test_order(OrderTotals::from_parts(9_999, 0, 0), items);
        assert!(bad.validate().is_err());
    }

    proptest! {
        #[test]
        fn from_parts_always_validates(
            subtotal in 0u64..1_000_000_000,
            tax in 0u64..1_000_000,
            shipping in 0u64..1_000_000,
        ) {
            let totals = OrderTotals::from_parts(subtotal, tax, shipping);
            prop_assert!(totals.validate().is_ok());
        }
    }
}
