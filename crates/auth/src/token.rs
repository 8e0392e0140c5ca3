//! Bearer-token resolution boundary.
//!
//! The API layer resolves a bearer token to a [`Caller`] through this
//! trait; how tokens are issued and decoded is deliberately outside the
//! core (non-goal: auth-provider wiring).

use std::collections::HashMap;

use chrono::Utc;

use planvault_core::AuthError;

use crate::caller::Caller;
use crate::claims::{TokenClaims, validate_claims};

/// Resolves a presented bearer token to an authenticated caller.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<Caller, AuthError>;
}

/// Static token table for dev/test deployments.
///
/// Each token maps to its claims; the expiry window is checked on every
/// `validate` call, so a stale entry stops resolving once it expires.
#[derive(Debug, Default)]
pub struct StaticTokenValidator {
    tokens: HashMap<String, TokenClaims>,
}

impl StaticTokenValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, claims: TokenClaims) -> Self {
        self.tokens.insert(token.into(), claims);
        self
    }
}

impl TokenValidator for StaticTokenValidator {
    fn validate(&self, token: &str) -> Result<Caller, AuthError> {
        let claims = self
            .tokens
            .get(token)
            .ok_or(AuthError::MissingCredential)?;
        validate_claims(claims, Utc::now())?;
        Ok(if claims.admin {
            Caller::admin(claims.sub)
        } else {
            Caller::customer(claims.sub)
        })
    }
}
