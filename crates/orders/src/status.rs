//! Order and payment status lifecycles.
//!
//! Transitions are checked in one place so every caller (webhook path,
//! cancellation, refund, admin tooling) shares the same rules.

use serde::{Deserialize, Serialize};

use planvault_core::StateError;

/// Order lifecycle.
///
/// `pending → processing → completed`; `pending|processing → cancelled`;
/// `completed → refunded`. Refund is a distinct transition — a completed
/// order can never become `cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Completed)
                | (Pending, Cancelled)
                | (Processing, Cancelled)
                | (Completed, Refunded)
        )
    }

    /// Validate a transition, returning the target status on success.
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, StateError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StateError::illegal(self.as_str(), next.as_str()))
        }
    }
}

/// Payment lifecycle.
///
/// `pending → completed`, `pending → failed`, `completed → refunded`.
/// `failed` and `refunded` are terminal; once a payment leaves `pending` the
/// only legal mutation is the refund of a completed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Completed) | (Pending, Failed) | (Completed, Refunded)
        )
    }

    /// Validate a transition, returning the target status on success.
    pub fn transition_to(self, next: PaymentStatus) -> Result<PaymentStatus, StateError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StateError::illegal(self.as_str(), next.as_str()))
        }
    }
}
