//! Central mapping from the error taxonomy to HTTP responses.
//!
//! Deterministic rejections map to 4xx (the provider does not retry);
//! transient failures map to 5xx (the provider retries). Denials never
//! leak asset data in the body.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use planvault_core::{AuthError, Error, ValidationError};

pub fn error_to_response(err: &Error) -> axum::response::Response {
    match err {
        Error::Auth(AuthError::InvalidSignature) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_signature", err.to_string())
        }
        Error::Auth(AuthError::Forbidden) => {
            json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden")
        }
        Error::Auth(AuthError::MissingCredential | AuthError::ExpiredCredential) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", "unauthorized")
        }
        Error::Validation(ValidationError::PaymentRequired) => json_error(
            StatusCode::PAYMENT_REQUIRED,
            "payment_required",
            "payment has not been completed for this order",
        ),
        Error::Validation(v) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", v.to_string())
        }
        Error::State(s) => json_error(StatusCode::CONFLICT, "state_error", s.to_string()),
        Error::NotFound(n) => json_error(StatusCode::NOT_FOUND, "not_found", n.to_string()),
        Error::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg.clone()),
        Error::Storage(_) | Error::Internal(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "internal error",
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use planvault_core::{NotFoundError, StorageError};

    #[test]
    fn status_mapping_follows_retry_semantics() {
        let cases = [
            (Error::Auth(AuthError::InvalidSignature), StatusCode::BAD_REQUEST),
            (Error::Auth(AuthError::Forbidden), StatusCode::FORBIDDEN),
            (
                Error::Validation(ValidationError::PaymentRequired),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                Error::Validation(ValidationError::MissingOrderId),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::NotFound(NotFoundError::Order("x".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                Error::Storage(StorageError::Put {
                    key: "k".into(),
                    reason: "io".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(error_to_response(&err).status(), status, "{err:?}");
        }
    }
}
