//! Consumed record-store interfaces.
//!
//! Both stores expose compare-and-set updates: the expected current status
//! is part of the call, and a mismatch fails with `Error::Conflict` without
//! writing. This is the serialization point for concurrent webhook
//! deliveries targeting the same order — two deliveries cannot both observe
//! `pending` and both win. In-memory implementations live in
//! `planvault-infra`.

use async_trait::async_trait;

use planvault_core::{CheckoutId, Error, OrderId};

use crate::order::Order;
use crate::payment::Payment;
use crate::status::{OrderStatus, PaymentStatus};

/// Durable store for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find(&self, id: OrderId) -> Result<Option<Order>, Error>;

    async fn insert(&self, order: Order) -> Result<(), Error>;

    /// Compare-and-set `status`; returns the updated order.
    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, Error>;

    /// Compare-and-set the embedded `payment.status`; returns the updated
    /// order. Optionally records the provider transaction id in the same
    /// atomic write.
    async fn update_payment_status(
        &self,
        id: OrderId,
        expected: PaymentStatus,
        next: PaymentStatus,
        provider_txn_id: Option<String>,
    ) -> Result<Order, Error>;
}

/// Durable store for per-attempt payment rows, keyed by checkout id.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn find_by_checkout(&self, checkout_id: &CheckoutId)
    -> Result<Option<Payment>, Error>;

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>, Error>;

    async fn insert(&self, payment: Payment) -> Result<(), Error>;

    /// Compare-and-set `status`; returns the updated payment.
    async fn update_status(
        &self,
        checkout_id: &CheckoutId,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<Payment, Error>;
}
