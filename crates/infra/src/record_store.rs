//! In-memory record stores with compare-and-set updates.
//!
//! Each CAS runs read-compare-write under one lock, so concurrent callers
//! serialize: two webhook deliveries for the same order cannot both observe
//! `pending` and both win.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use planvault_assets::{AssetCatalog, AssetCategory, AssetOwner, AssetRecord};
use planvault_core::{CheckoutId, Error, NotFoundError, OrderId, StorageError};
use planvault_orders::{Order, OrderStatus, OrderStore, Payment, PaymentStatus, PaymentStore};

/// In-memory order store. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find(&self, id: OrderId) -> Result<Option<Order>, Error> {
        let orders = self.orders.read().unwrap_or_else(|e| e.into_inner());
        Ok(orders.get(&id).cloned())
    }

    async fn insert(&self, order: Order) -> Result<(), Error> {
        let mut orders = self.orders.write().unwrap_or_else(|e| e.into_inner());
        if orders.contains_key(&order.id) {
            return Err(Error::conflict(format!("order '{}' already exists", order.id)));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, Error> {
        let mut orders = self.orders.write().unwrap_or_else(|e| e.into_inner());
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| NotFoundError::Order(id.to_string()))?;
        if order.status != expected {
            return Err(Error::conflict(format!(
                "order '{id}' status is '{}', expected '{}'",
                order.status.as_str(),
                expected.as_str()
            )));
        }
        order.status = next;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn update_payment_status(
        &self,
        id: OrderId,
        expected: PaymentStatus,
        next: PaymentStatus,
        provider_txn_id: Option<String>,
    ) -> Result<Order, Error> {
        let mut orders = self.orders.write().unwrap_or_else(|e| e.into_inner());
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| NotFoundError::Order(id.to_string()))?;
        if order.payment.status != expected {
            return Err(Error::conflict(format!(
                "order '{id}' payment status is '{}', expected '{}'",
                order.payment.status.as_str(),
                expected.as_str()
            )));
        }
        order.payment.status = next;
        if provider_txn_id.is_some() {
            order.payment.provider_txn_id = provider_txn_id;
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

/// In-memory payment store keyed by provider checkout id.
#[derive(Debug, Default)]
pub struct InMemoryPaymentStore {
    payments: RwLock<HashMap<CheckoutId, Payment>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn find_by_checkout(
        &self,
        checkout_id: &CheckoutId,
    ) -> Result<Option<Payment>, Error> {
        let payments = self.payments.read().unwrap_or_else(|e| e.into_inner());
        Ok(payments.get(checkout_id).cloned())
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>, Error> {
        let payments = self.payments.read().unwrap_or_else(|e| e.into_inner());
        Ok(payments
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, payment: Payment) -> Result<(), Error> {
        let mut payments = self.payments.write().unwrap_or_else(|e| e.into_inner());
        if payments.contains_key(&payment.checkout_id) {
            return Err(Error::conflict(format!(
                "payment for checkout '{}' already exists",
                payment.checkout_id
            )));
        }
        payments.insert(payment.checkout_id.clone(), payment);
        Ok(())
    }

    async fn update_status(
        &self,
        checkout_id: &CheckoutId,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<Payment, Error> {
        let mut payments = self.payments.write().unwrap_or_else(|e| e.into_inner());
        let payment = payments
            .get_mut(checkout_id)
            .ok_or_else(|| NotFoundError::Payment(checkout_id.to_string()))?;
        if payment.status != expected {
            return Err(Error::conflict(format!(
                "payment '{checkout_id}' status is '{}', expected '{}'",
                payment.status.as_str(),
                expected.as_str()
            )));
        }
        payment.status = next;
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }
}

/// In-memory asset catalog, indexed by owner.
#[derive(Debug, Default)]
pub struct InMemoryAssetCatalog {
    records: RwLock<Vec<AssetRecord>>,
}

impl InMemoryAssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetCatalog for InMemoryAssetCatalog {
    async fn list_assets(&self, owner: AssetOwner) -> Result<Vec<AssetRecord>, StorageError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.iter().filter(|r| r.owner == owner).cloned().collect())
    }

    async fn create_assets(
        &self,
        owner: AssetOwner,
        category: AssetCategory,
        mut new_records: Vec<AssetRecord>,
    ) -> Result<(), StorageError> {
        debug_assert!(new_records
            .iter()
            .all(|r| r.owner == owner && r.category == category));
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.append(&mut new_records);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planvault_core::{PlanId, UserId};
    use planvault_orders::{CustomerInfo, OrderTotals, PaymentInfo, PaymentMethod};

    fn order() -> Order {
        Order {
            id: OrderId::new(),
            customer_id: UserId::new(),
            customer: CustomerInfo {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                phone: None,
            },
            items: Vec::new(),
            payment: PaymentInfo {
                method: PaymentMethod::Card,
                checkout_id: CheckoutId::new("cs_1"),
                provider_txn_id: None,
                status: PaymentStatus::Pending,
            },
            status: OrderStatus::Pending,
            totals: OrderTotals::from_parts(0, 0, 0),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn order_cas_rejects_stale_expectation() {
        let store = InMemoryOrderStore::new();
        let o = order();
        let id = o.id;
        store.insert(o).await.unwrap();

        store
            .update_status(id, OrderStatus::Pending, OrderStatus::Processing)
            .await
            .unwrap();

        // Second caller still expecting `pending` loses.
        let err = store
            .update_status(id, OrderStatus::Pending, OrderStatus::Processing)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn payment_cas_only_one_winner() {
        let store = InMemoryPaymentStore::new();
        let checkout = CheckoutId::new("cs_1");
        store
            .insert(Payment::new(checkout.clone(), OrderId::new(), 10_000))
            .await
            .unwrap();

        let first = store
            .update_status(&checkout, PaymentStatus::Pending, PaymentStatus::Completed)
            .await;
        let second = store
            .update_status(&checkout, PaymentStatus::Pending, PaymentStatus::Completed)
            .await;

        assert!(first.is_ok());
        assert!(matches!(second.unwrap_err(), Error::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_payment_is_not_found() {
        let store = InMemoryPaymentStore::new();
        let err = store
            .update_status(
                &CheckoutId::new("nope"),
                PaymentStatus::Pending,
                PaymentStatus::Completed,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(NotFoundError::Payment(_))));
    }

    #[tokio::test]
    async fn catalog_filters_by_owner() {
        let catalog = InMemoryAssetCatalog::new();
        let plan = AssetOwner::Plan(PlanId::new());
        let other = AssetOwner::Order(OrderId::new());

        let record = AssetRecord {
            id: planvault_core::AssetId::new(),
            display_name: "plan.pdf".into(),
            storage_key: "plan/x/pdf/plan.pdf".into(),
            url: "https://storage.local/plan.pdf".into(),
            byte_size: 4,
            content_type: "application/pdf".into(),
            category: AssetCategory::Pdf,
            owner: plan,
            uploaded_at: Utc::now(),
        };
        catalog
            .create_assets(plan, AssetCategory::Pdf, vec![record])
            .await
            .unwrap();

        assert_eq!(catalog.list_assets(plan).await.unwrap().len(), 1);
        assert!(catalog.list_assets(other).await.unwrap().is_empty());
    }
}
