//! `planvault-orders` — Order and Payment domain model.
//!
//! Pure state: lifecycle enums with guarded transitions, the totals
//! invariant, and the records the fulfillment service mutates through the
//! record store. No IO here.

pub mod order;
pub mod payment;
pub mod status;
pub mod store;

pub use order::{CustomerInfo, LineItem, Order, OrderTotals};
pub use payment::{Payment, PaymentInfo, PaymentMethod};
pub use status::{OrderStatus, PaymentStatus};
pub use store::{OrderStore, PaymentStore};
