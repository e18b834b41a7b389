use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use coursepath_core::error::CoreError;
use coursepath_core::tier::upgrade_prompt;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`]; request-shape problems surface as
/// `CoreError::Validation` from the extractors. Implements [`IntoResponse`]
/// to produce `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut extra = serde_json::Map::new();
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::AlreadyEnrolled { .. } => {
                    (StatusCode::CONFLICT, "ALREADY_ENROLLED", core.to_string())
                }
                CoreError::AlreadyCompleted { .. } => {
                    (StatusCode::CONFLICT, "ALREADY_COMPLETED", core.to_string())
                }
                CoreError::StaleRecord { .. } => (
                    StatusCode::CONFLICT,
                    "STALE_RECORD",
                    "The record was modified by another request; retry the operation".to_string(),
                ),
                CoreError::NotEnrolled { .. } => {
                    (StatusCode::BAD_REQUEST, "NOT_ENROLLED", core.to_string())
                }
                CoreError::NodeLocked { .. } => {
                    (StatusCode::FORBIDDEN, "NODE_LOCKED", core.to_string())
                }
                CoreError::TierRequired { required, current } => {
                    extra.insert("requiredTier".into(), json!(required));
                    extra.insert("currentTier".into(), json!(current));
                    (
                        StatusCode::FORBIDDEN,
                        "UPGRADE_REQUIRED",
                        upgrade_prompt(*required),
                    )
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Storage(msg) => {
                    tracing::error!(error = %msg, "Storage error");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORAGE_ERROR",
                        "Storage is temporarily unavailable".to_string(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },
        };

        let mut body = serde_json::Map::new();
        body.insert("error".into(), json!(message));
        body.insert("code".into(), json!(code));
        body.extend(extra);

        (status, axum::Json(serde_json::Value::Object(body))).into_response()
    }
}
