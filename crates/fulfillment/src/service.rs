//! The fulfillment state machine service.

use std::sync::Arc;

use planvault_core::{CheckoutId, Error, NotFoundError, OrderId, StateError, ValidationError};
use planvault_orders::{Order, OrderStatus, OrderStore, PaymentStatus, PaymentStore};

use crate::generator::AssetGenerator;

/// Result of applying a verified payment-success event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    /// First confirmation: payment completed, all assets cataloged, order
    /// completed.
    Fulfilled { assets_cataloged: usize },

    /// The payment was already terminal-completed; nothing was regenerated.
    AlreadyFulfilled,

    /// Payment confirmed, but asset generation did not fully succeed. The
    /// order stays in `processing`; the failure is surfaced for
    /// retry/alerting and is not fatal to the webhook acknowledgement.
    AssetsPending { detail: String },
}

/// Drives order/payment transitions off verified provider events.
///
/// Concurrent deliveries for one order serialize on the record store's
/// compare-and-set: exactly one caller wins `pending → completed` and only
/// the winner triggers asset generation.
pub struct FulfillmentService {
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentStore>,
    generator: Arc<dyn AssetGenerator>,
}

impl FulfillmentService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentStore>,
        generator: Arc<dyn AssetGenerator>,
    ) -> Self {
        Self {
            orders,
            payments,
            generator,
        }
    }

    /// Apply a verified payment-success event to `order_id`.
    ///
    /// Idempotent: replaying against an already-completed payment is a
    /// no-op that still reports success.
    pub async fn handle_payment_success(
        &self,
        order_id: OrderId,
        checkout_id: Option<CheckoutId>,
        provider_txn_id: Option<String>,
    ) -> Result<FulfillmentOutcome, Error> {
        let order = self.require_order(order_id).await?;
        let checkout = checkout_id.unwrap_or_else(|| order.payment.checkout_id.clone());

        // Terminal-state fast path: repeat delivery after a lost dedup set.
        if order.payment.status == PaymentStatus::Completed {
            tracing::info!(order_id = %order_id, "payment already completed; replay is a no-op");
            return Ok(FulfillmentOutcome::AlreadyFulfilled);
        }

        // The CAS on the payment row is the serialization point: exactly one
        // delivery moves `pending → completed`.
        match self
            .payments
            .update_status(&checkout, PaymentStatus::Pending, PaymentStatus::Completed)
            .await
        {
            Ok(_) => {}
            Err(Error::Conflict(_)) => {
                let row = self
                    .payments
                    .find_by_checkout(&checkout)
                    .await?
                    .ok_or_else(|| NotFoundError::Payment(checkout.to_string()))?;
                return match row.status {
                    PaymentStatus::Completed => Ok(FulfillmentOutcome::AlreadyFulfilled),
                    status => Err(StateError::illegal(status.as_str(), "completed").into()),
                };
            }
            Err(err) => return Err(err),
        }

        // Mirror into the order's embedded payment sub-record. A conflict
        // here means another path already mirrored it; tolerate that.
        match self
            .orders
            .update_payment_status(
                order_id,
                PaymentStatus::Pending,
                PaymentStatus::Completed,
                provider_txn_id,
            )
            .await
        {
            Ok(_) | Err(Error::Conflict(_)) => {}
            Err(err) => return Err(err),
        }

        let order = match self
            .orders
            .update_status(order_id, OrderStatus::Pending, OrderStatus::Processing)
            .await
        {
            Ok(order) => order,
            // A previous partial attempt may have left the order processing.
            Err(Error::Conflict(_)) => self.require_order(order_id).await?,
            Err(err) => return Err(err),
        };

        tracing::info!(order_id = %order_id, checkout = %checkout, "payment confirmed; generating assets");
        self.run_asset_generation(&order).await
    }

    /// Re-run asset generation for an order stuck in `processing`.
    ///
    /// The retry path after a partial fulfillment: payment must already be
    /// completed (the customer is never re-charged).
    pub async fn retry_asset_generation(
        &self,
        order_id: OrderId,
    ) -> Result<FulfillmentOutcome, Error> {
        let order = self.require_order(order_id).await?;
        if order.payment.status != PaymentStatus::Completed {
            return Err(ValidationError::PaymentRequired.into());
        }
        if order.status != OrderStatus::Processing {
            return Err(StateError::illegal(order.status.as_str(), "processing").into());
        }
        self.run_asset_generation(&order).await
    }

    /// Cancel an order. Legal from `pending` or `processing` only.
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order, Error> {
        let order = self.require_order(order_id).await?;
        // Validate the transition before touching the store so an illegal
        // cancel surfaces as a state error, not a CAS conflict.
        order.status.transition_to(OrderStatus::Cancelled)?;
        self.orders
            .update_status(order_id, order.status, OrderStatus::Cancelled)
            .await
    }

    /// Refund a completed order: a distinct transition, never `cancelled`.
    pub async fn refund_order(&self, order_id: OrderId) -> Result<Order, Error> {
        let order = self.require_order(order_id).await?;
        order.status.transition_to(OrderStatus::Refunded)?;

        self.payments
            .update_status(
                &order.payment.checkout_id,
                PaymentStatus::Completed,
                PaymentStatus::Refunded,
            )
            .await?;
        match self
            .orders
            .update_payment_status(
                order_id,
                PaymentStatus::Completed,
                PaymentStatus::Refunded,
                None,
            )
            .await
        {
            Ok(_) | Err(Error::Conflict(_)) => {}
            Err(err) => return Err(err),
        }

        tracing::info!(order_id = %order_id, "order refunded");
        self.orders
            .update_status(order_id, OrderStatus::Completed, OrderStatus::Refunded)
            .await
    }

    /// Record a failed payment attempt and cancel the order.
    pub async fn mark_payment_failed(&self, checkout_id: &CheckoutId) -> Result<(), Error> {
        let payment = self
            .payments
            .update_status(checkout_id, PaymentStatus::Pending, PaymentStatus::Failed)
            .await?;

        match self
            .orders
            .update_payment_status(
                payment.order_id,
                PaymentStatus::Pending,
                PaymentStatus::Failed,
                None,
            )
            .await
        {
            Ok(_) | Err(Error::Conflict(_)) => {}
            Err(err) => return Err(err),
        }

        let order = self.require_order(payment.order_id).await?;
        if order.status.transition_to(OrderStatus::Cancelled).is_ok() {
            self.orders
                .update_status(payment.order_id, order.status, OrderStatus::Cancelled)
                .await?;
        }
        tracing::info!(order_id = %payment.order_id, checkout = %checkout_id, "payment failed");
        Ok(())
    }

    async fn run_asset_generation(&self, order: &Order) -> Result<FulfillmentOutcome, Error> {
        match self.generator.generate(order).await {
            Ok(outcome) if outcome.is_complete() => {
                let cataloged = outcome.record_count();
                self.orders
                    .update_status(order.id, OrderStatus::Processing, OrderStatus::Completed)
                    .await?;
                tracing::info!(
                    order_id = %order.id,
                    assets = cataloged,
                    "order fulfilled"
                );
                Ok(FulfillmentOutcome::Fulfilled {
                    assets_cataloged: cataloged,
                })
            }
            Ok(outcome) => {
                let failed: Vec<&str> = outcome
                    .failures
                    .iter()
                    .map(|f| f.category.as_str())
                    .collect();
                let detail = format!("categories failed: {}", failed.join(", "));
                tracing::error!(
                    order_id = %order.id,
                    detail = %detail,
                    orphaned = outcome.orphaned_keys.len(),
                    "asset generation incomplete; order stays processing"
                );
                Ok(FulfillmentOutcome::AssetsPending { detail })
            }
            Err(err) => {
                tracing::error!(
                    order_id = %order.id,
                    error = %err,
                    "asset generation errored; order stays processing"
                );
                Ok(FulfillmentOutcome::AssetsPending {
                    detail: err.to_string(),
                })
            }
        }
    }

    async fn require_order(&self, order_id: OrderId) -> Result<Order, Error> {
        self.orders
            .find(order_id)
            .await?
            .ok_or_else(|| NotFoundError::Order(order_id.to_string()).into())
    }
}
