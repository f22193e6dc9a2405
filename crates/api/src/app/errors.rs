use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use eventick_auth::DirectoryError;
use eventick_ledger::LedgerError;

use crate::context::PrincipalContext;

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::EventNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        LedgerError::InvalidQuantity(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_quantity", err.to_string())
        }
        LedgerError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
        }
        LedgerError::InsufficientCapacity { remaining, .. } => {
            let message = err.to_string();
            (
                StatusCode::CONFLICT,
                axum::Json(json!({
                    "error": "insufficient_capacity",
                    "message": message,
                    "tickets_remaining": remaining,
                })),
            )
                .into_response()
        }
        LedgerError::RetriesExhausted { .. } => {
            json_error(StatusCode::CONFLICT, "conflict", err.to_string())
        }
        LedgerError::StorageUnavailable(_) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "storage_unavailable",
            err.to_string(),
        ),
    }
}

pub fn directory_error_to_response(err: DirectoryError) -> axum::response::Response {
    match err {
        DirectoryError::Unavailable(_) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "storage_unavailable",
            err.to_string(),
        ),
        DirectoryError::DuplicateEmail(_) => {
            json_error(StatusCode::CONFLICT, "duplicate_email", err.to_string())
        }
    }
}

/// Gate for admin-only handlers: 401 without a principal, 403 for a
/// non-admin one.
pub fn require_admin(
    principal: Option<&PrincipalContext>,
) -> Result<(), axum::response::Response> {
    match principal {
        None => Err(json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "authentication required",
        )),
        Some(p) if !p.role().is_admin() => Err(json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "admin role required",
        )),
        Some(_) => Ok(()),
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
