//! `planvault-core` — shared foundation for the fulfillment platform.
//!
//! This crate contains **pure** building blocks (ids, errors, entity trait).
//! No IO, no transport, no storage concerns.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{
    AuthError, CoreResult, Error, NotFoundError, StateError, StorageError, ValidationError,
};
pub use id::{AssetId, CheckoutId, OrderId, PlanId, UserId};
