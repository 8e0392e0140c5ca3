//! Authenticated caller identity.

use planvault_core::UserId;

/// The authenticated caller of a download request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Caller {
    user_id: UserId,
    admin: bool,
}

impl Caller {
    pub fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: true,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }
}
