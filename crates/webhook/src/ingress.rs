//! Webhook ingress: authenticate, parse, deduplicate.
//!
//! Produces a typed [`Disposition`] that the HTTP layer maps to a response:
//! errors here are deterministic rejections (the provider must not retry);
//! anything transient downstream is the fulfillment service's concern.

use planvault_core::{CheckoutId, Error, OrderId};

use crate::dedup::SeenEvents;
use crate::event::{WebhookEventKind, parse_event};
use crate::signature::SignatureVerifier;

/// What the ingress decided about one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// A first-sighting payment success: run fulfillment for this order.
    Fulfill {
        order_id: OrderId,
        checkout_id: Option<CheckoutId>,
        event_id: Option<String>,
    },
    /// A replayed delivery of an already-seen event id. Acknowledge, no-op.
    Duplicate { order_id: OrderId },
    /// A well-formed event of a type we do not act on. Acknowledge, no-op.
    Ignored { event_type: String },
}

/// Authenticates and classifies inbound provider deliveries.
#[derive(Debug)]
pub struct WebhookIngress {
    verifier: SignatureVerifier,
    seen: SeenEvents,
}

impl WebhookIngress {
    pub fn new(verifier: SignatureVerifier, seen: SeenEvents) -> Self {
        Self { verifier, seen }
    }

    /// Retract a recorded event id after a transient downstream failure,
    /// so the provider's retry is not swallowed as a duplicate.
    pub fn retract(&self, event_id: &str) {
        self.seen.forget(event_id);
    }

    /// Process one raw delivery.
    ///
    /// Errors are deterministic (bad signature, malformed payload, missing
    /// order id) and map to 4xx. No state is mutated on any error path.
    pub fn accept(
        &self,
        signature_header: Option<&str>,
        body: &[u8],
    ) -> Result<Disposition, Error> {
        self.verifier.verify(body, signature_header)?;

        let event = parse_event(body)?;
        match event.kind {
            WebhookEventKind::PaymentSucceeded {
                order_id,
                checkout_id,
            } => {
                if let Some(id) = &event.event_id {
                    if !self.seen.first_sighting(id) {
                        tracing::info!(event_id = %id, order_id = %order_id, "duplicate webhook delivery");
                        return Ok(Disposition::Duplicate { order_id });
                    }
                }
                Ok(Disposition::Fulfill {
                    order_id,
                    checkout_id,
                    event_id: event.event_id,
                })
            }
            WebhookEventKind::Other(event_type) => {
                tracing::debug!(event_type = %event_type, "ignoring unrecognized webhook event");
                Ok(Disposition::Ignored { event_type })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::VerificationMode;
    use planvault_core::{AuthError, ValidationError};

    fn ingress() -> WebhookIngress {
        WebhookIngress::new(
            SignatureVerifier::new("whsec_test", VerificationMode::Enforce),
            SeenEvents::default(),
        )
    }

    fn signed(ingress: &WebhookIngress, body: &[u8]) -> String {
        ingress.verifier.sign(body)
    }

    #[test]
    fn valid_payment_success_is_dispatched() {
        let ingress = ingress();
        let order_id = OrderId::new();
        let body = serde_json::to_vec(&serde_json::json!({
            "id": "evt_1",
            "type": "payment_success",
            "order_id": order_id.to_string(),
        }))
        .unwrap();
        let sig = signed(&ingress, &body);

        let disposition = ingress.accept(Some(&sig), &body).unwrap();
        assert!(matches!(
            disposition,
            Disposition::Fulfill { order_id: got, .. } if got == order_id
        ));
    }

    #[test]
    fn replayed_event_id_becomes_duplicate() {
        let ingress = ingress();
        let order_id = OrderId::new();
        let body = serde_json::to_vec(&serde_json::json!({
            "id": "evt_1",
            "type": "payment_success",
            "order_id": order_id.to_string(),
        }))
        .unwrap();
        let sig = signed(&ingress, &body);

        assert!(matches!(
            ingress.accept(Some(&sig), &body).unwrap(),
            Disposition::Fulfill { .. }
        ));
        assert_eq!(
            ingress.accept(Some(&sig), &body).unwrap(),
            Disposition::Duplicate { order_id }
        );
    }

    #[test]
    fn tampered_body_is_rejected_and_not_recorded() {
        let ingress = ingress();
        let order_id = OrderId::new();
        let body = serde_json::to_vec(&serde_json::json!({
            "id": "evt_1",
            "type": "payment_success",
            "order_id": order_id.to_string(),
        }))
        .unwrap();
        let sig = signed(&ingress, &body);

        let mut tampered = body.clone();
        tampered[0] ^= 0x01;
        let err = ingress.accept(Some(&sig), &tampered).unwrap_err();
        assert_eq!(err, Error::Auth(AuthError::InvalidSignature));

        // The rejection left no dedup state behind.
        assert!(matches!(
            ingress.accept(Some(&sig), &body).unwrap(),
            Disposition::Fulfill { .. }
        ));
    }

    #[test]
    fn unknown_event_type_is_ignored() {
        let ingress = ingress();
        let body = br#"{"type":"customer.updated"}"#;
        let sig = signed(&ingress, body);
        assert_eq!(
            ingress.accept(Some(&sig), body).unwrap(),
            Disposition::Ignored {
                event_type: "customer.updated".into()
            }
        );
    }

    #[test]
    fn missing_order_id_is_a_validation_error() {
        let ingress = ingress();
        let body = br#"{"type":"payment_success"}"#;
        let sig = signed(&ingress, body);
        assert_eq!(
            ingress.accept(Some(&sig), body).unwrap_err(),
            Error::Validation(ValidationError::MissingOrderId)
        );
    }
}
