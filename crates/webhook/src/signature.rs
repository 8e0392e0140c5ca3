//! Webhook signature verification.
//!
//! The provider signs the exact request body with HMAC-SHA256 under a shared
//! secret and sends the hex-encoded tag in a header. Verification uses the
//! MAC's constant-time comparison; the hex signature is decoded first so a
//! malformed header fails the same way as a wrong one.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use planvault_core::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Whether signature verification is enforced.
///
/// `Bypass` exists for local testing against providers that cannot sign;
/// it must never be configured in production and is logged on every use.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VerificationMode {
    Enforce,
    Bypass,
}

/// Verifies provider signatures over raw body bytes.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
    mode: VerificationMode,
}

impl SignatureVerifier {
    pub fn new(secret: impl AsRef<[u8]>, mode: VerificationMode) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            mode,
        }
    }

    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    /// Verify `signature_header` (hex HMAC-SHA256) against `body`.
    pub fn verify(&self, body: &[u8], signature_header: Option<&str>) -> Result<(), AuthError> {
        if self.mode == VerificationMode::Bypass {
            tracing::warn!("webhook signature verification BYPASSED (non-production mode)");
            return Ok(());
        }

        let header = signature_header.ok_or(AuthError::MissingCredential)?;
        let expected = hex::decode(header.trim()).map_err(|_| AuthError::InvalidSignature)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AuthError::InvalidSignature)?;
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| AuthError::InvalidSignature)
    }

    /// Compute the hex signature for `body`. Used by tests and by outbound
    /// delivery tooling.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any size");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }
}

impl core::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Never expose the secret in logs.
        f.debug_struct("SignatureVerifier")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
