//! The Access Gate: ties asset retrieval to verified payment state.
//!
//! Evaluated on every request against the current order record — never
//! cached. A refund or administrative payment correction therefore revokes
//! access on the next check.

use planvault_core::{AuthError, Error, ValidationError};
use planvault_orders::{Order, PaymentStatus};

use crate::caller::Caller;

/// Authorize `caller` to download assets belonging to `order`.
///
/// Administrators pass unconditionally. For everyone else, ownership is
/// checked before payment state, so a non-owner learns nothing about the
/// order's payment status.
///
/// - Not owner and not admin → `AuthError::Forbidden`
/// - Owner with payment not completed → `ValidationError::PaymentRequired`
pub fn authorize_download(caller: &Caller, order: &Order) -> Result<(), Error> {
    if caller.is_admin() {
        return Ok(());
    }

    if !order.is_owned_by(caller.user_id()) {
        return Err(AuthError::Forbidden.into());
    }

    if order.payment.status != PaymentStatus::Completed {
        return Err(ValidationError::PaymentRequired.into());
    }

    Ok(())
}
