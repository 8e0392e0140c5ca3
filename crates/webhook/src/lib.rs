//! `planvault-webhook` — payment-provider webhook ingress.
//!
//! Authenticates inbound deliveries (HMAC-SHA256 over the exact byte
//! payload), parses them into typed events, and deduplicates provider event
//! ids over a bounded time window before the fulfillment state machine ever
//! runs.

pub mod dedup;
pub mod event;
pub mod ingress;
pub mod signature;

pub use dedup::SeenEvents;
pub use event::{WebhookEvent, WebhookEventKind, parse_event};
pub use ingress::{Disposition, WebhookIngress};
pub use signature::{SignatureVerifier, VerificationMode};
