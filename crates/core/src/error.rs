//! Error taxonomy shared across the fulfillment platform.
//!
//! Each enum covers one concern; [`Error`] composes them for callers that
//! need a single error channel (HTTP mapping, service results). Keep the
//! variants deterministic and side-effect free — retry policy is decided by
//! the caller, not encoded here.

use thiserror::Error;

/// Result type used across the platform.
pub type CoreResult<T> = Result<T, Error>;

/// Authentication / authorization failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The webhook signature did not match the request body.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// The caller is authenticated but not allowed to access the resource.
    #[error("forbidden")]
    Forbidden,

    /// No credential was presented where one is required.
    #[error("missing credential")]
    MissingCredential,

    /// The presented credential is outside its validity window.
    #[error("expired credential")]
    ExpiredCredential,
}

/// Deterministic input/state validation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A recognized payment event carried no order reference.
    #[error("webhook event is missing an order id")]
    MissingOrderId,

    /// The request body could not be parsed into a webhook event.
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    /// Download requested for an order whose payment is not completed.
    #[error("payment required")]
    PaymentRequired,

    /// A category outside the fixed asset-category set was supplied.
    #[error("unknown asset category '{0}'")]
    UnknownCategory(String),

    /// A file's declared MIME type is not allowed for its category.
    #[error("file '{file}' has MIME type '{mime}' which is not allowed for category '{category}'")]
    DisallowedMime {
        file: String,
        mime: String,
        category: String,
    },

    /// A category batch exceeds that category's file-count limit.
    #[error("category '{category}' accepts at most {max} files, got {got}")]
    TooManyFiles {
        category: String,
        max: usize,
        got: usize,
    },

    /// The combined batch exceeds the total payload ceiling.
    #[error("total upload size {got} bytes exceeds ceiling of {max} bytes")]
    PayloadTooLarge { got: u64, max: u64 },

    /// A required field was absent.
    #[error("missing required field '{0}'")]
    MissingField(String),

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Order totals do not satisfy `total == subtotal + tax + shipping`.
    #[error("order totals are inconsistent: {0}")]
    InvalidTotals(String),
}

impl ValidationError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField(name.into())
    }
}

/// Illegal lifecycle transitions.
///
/// Never coerced into success: a state error aborts the transition and is
/// logged for operator review.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("illegal transition from '{from}' to '{to}'")]
    IllegalTransition { from: String, to: String },
}

impl StateError {
    pub fn illegal(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::IllegalTransition {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Object-storage backend failures. Retryable at the coordinator level.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("put failed for key '{key}': {reason}")]
    Put { key: String, reason: String },

    #[error("get failed for key '{key}': {reason}")]
    Get { key: String, reason: String },

    #[error("signing failed for key '{key}': {reason}")]
    Sign { key: String, reason: String },

    #[error("delete failed for key '{key}': {reason}")]
    Delete { key: String, reason: String },
}

/// Unknown-entity lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("order '{0}' not found")]
    Order(String),

    #[error("payment for checkout '{0}' not found")]
    Payment(String),

    #[error("asset '{0}' not found")]
    Asset(String),
}

/// Top-level error composing the per-concern taxonomies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Optimistic update lost a race (stale expected state).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Transient internal failure; safe for the caller to retry.
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for deterministic rejections the caller should not retry.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Error::Auth(_) | Error::Validation(_) | Error::State(_) | Error::NotFound(_)
        )
    }
}
