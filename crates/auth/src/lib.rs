//! `planvault-auth` — caller identity and the download Access Gate.
//!
//! This crate is intentionally decoupled from HTTP and storage: it validates
//! token claims deterministically and makes pure authorization decisions
//! over the current order record.

pub mod caller;
pub mod claims;
pub mod gate;
pub mod token;

pub use caller::Caller;
pub use claims::{TokenClaims, validate_claims};
pub use gate::authorize_download;
pub use token::{StaticTokenValidator, TokenValidator};
