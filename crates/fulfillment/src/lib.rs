//! `planvault-fulfillment` — the order fulfillment state machine.
//!
//! Applies a verified payment event to an order exactly once: confirms the
//! payment through a compare-and-set in the record store, triggers asset
//! generation on the first successful transition only, and advances the
//! order through `processing` to `completed`. Payment confirmation and
//! asset delivery are decoupled: a failed asset step is retryable without
//! re-charging the customer.

pub mod generator;
pub mod service;

pub use generator::{AssetGenerator, PlanPackageGenerator};
pub use service::{FulfillmentOutcome, FulfillmentService};
