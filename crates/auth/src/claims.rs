//! API token claims (transport-agnostic).
//!
//! This is the minimal claim set the platform expects once a token has been
//! decoded by whatever transport/security layer is in use. Signature
//! verification/decoding is intentionally outside this crate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use planvault_core::{AuthError, UserId};

/// Token claims model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Whether the subject holds administrative privilege.
    pub admin: bool,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    /// Claims issued now and valid for `ttl`.
    pub fn valid_for(sub: UserId, admin: bool, ttl: std::time::Duration) -> Self {
        let now = Utc::now();
        // Out-of-range ttls clamp to a day rather than panic.
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(24));
        Self {
            sub,
            admin,
            issued_at: now,
            expires_at: now + ttl,
        }
    }
}

/// Deterministically validate token claims against `now`.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), AuthError> {
    if claims.expires_at <= claims.issued_at {
        return Err(AuthError::ExpiredCredential);
    }
    if now < claims.issued_at {
        return Err(AuthError::ExpiredCredential);
    }
    if now >= claims.expires_at {
        return Err(AuthError::ExpiredCredential);
    }
    Ok(())
}
