use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use agristore_core::DomainError;
use agristore_infra::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "storage failure")
        }
        e @ ServiceError::PartialFailure { .. } => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "partial_failure", e.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "unauthorized", message),
        DomainError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", message),
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::BAD_REQUEST, "insufficient_stock", message)
        }
        DomainError::UnsupportedFormat(_) => {
            json_error(StatusCode::BAD_REQUEST, "unsupported_format", message)
        }
        DomainError::UnsupportedType(_) => {
            json_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_type", message)
        }
        DomainError::TooLarge { .. } => json_error(StatusCode::PAYLOAD_TOO_LARGE, "too_large", message),
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

/// Malformed request bodies and query strings.
pub fn bad_request(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", message)
}
