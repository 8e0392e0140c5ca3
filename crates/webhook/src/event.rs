//! Typed webhook events parsed from provider payloads.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use planvault_core::{CheckoutId, OrderId, ValidationError};

/// Semantic kind of a provider event.
///
/// `payment_success` and `checkout_completed` are aliases of the same
/// semantic event. Everything else is accepted but produces no side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    PaymentSucceeded {
        order_id: OrderId,
        checkout_id: Option<CheckoutId>,
    },
    Other(String),
}

/// A parsed provider delivery. Ephemeral: not persisted, deduplicated by
/// `event_id` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Provider-assigned delivery/event id, when present.
    pub event_id: Option<String>,
    pub kind: WebhookEventKind,
    pub received_at: DateTime<Utc>,
}

impl WebhookEvent {
    pub fn is_payment_success(&self) -> bool {
        matches!(self.kind, WebhookEventKind::PaymentSucceeded { .. })
    }
}

/// Parse a raw body into a typed event.
///
/// Recognized types extract the order id from the top level (`order_id` /
/// `orderId`) or from a `metadata` sub-object; a recognized event without
/// one fails with `MissingOrderId`. Unknown types parse successfully to
/// `Other` so the provider gets a 200 and stops retrying.
pub fn parse_event(body: &[u8]) -> Result<WebhookEvent, ValidationError> {
    let payload: JsonValue = serde_json::from_slice(body)
        .map_err(|e| ValidationError::malformed(e.to_string()))?;

    let event_type = payload
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| ValidationError::missing_field("type"))?
        .to_string();

    let event_id = payload
        .get("id")
        .or_else(|| payload.get("event_id"))
        .and_then(JsonValue::as_str)
        .map(str::to_string);

    let kind = match event_type.as_str() {
        "payment_success" | "checkout_completed" => {
            let order_id = extract_order_id(&payload)?;
            let checkout_id = payload
                .get("checkout_id")
                .or_else(|| payload.get("session_id"))
                .and_then(JsonValue::as_str)
                .map(CheckoutId::new);
            WebhookEventKind::PaymentSucceeded {
                order_id,
                checkout_id,
            }
        }
        _ => WebhookEventKind::Other(event_type),
    };

    Ok(WebhookEvent {
        event_id,
        kind,
        received_at: Utc::now(),
    })
}

fn extract_order_id(payload: &JsonValue) -> Result<OrderId, ValidationError> {
    let raw = payload
        .get("order_id")
        .or_else(|| payload.get("orderId"))
        .or_else(|| {
            payload
                .get("metadata")
                .and_then(|m| m.get("order_id").or_else(|| m.get("orderId")))
        })
        .and_then(JsonValue::as_str)
        .ok_or(ValidationError::MissingOrderId)?;

    raw.parse::<OrderId>()
        .map_err(|_| ValidationError::invalid_id(format!("order_id '{raw}' is not a UUID")))
}
