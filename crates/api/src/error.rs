use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain::error::{ErrorKind, PreconditionKind};

/// Transport-level error surfaced by route handlers.
///
/// Engine failures arrive as [`ErrorKind`] and are mapped to status codes
/// here; the engine itself never decides wire representation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Gone: {0}")]
    Gone(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Gone(msg) => (StatusCode::GONE, "offer_expired", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "precondition_failed",
                msg.clone(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ErrorKind> for ApiError {
    fn from(err: ErrorKind) -> Self {
        match err {
            ErrorKind::NotFound { .. } => ApiError::NotFound(err.to_string()),
            ErrorKind::Unauthorized => ApiError::Unauthorized("Caller not authenticated".into()),
            ErrorKind::Forbidden { .. } => ApiError::Forbidden(err.to_string()),
            ErrorKind::IllegalTransition { .. } => ApiError::Conflict(err.to_string()),
            ErrorKind::AlreadyExists { .. } => ApiError::Conflict(err.to_string()),
            // Acceptance losers learn only that the trip is gone, never who won.
            ErrorKind::AlreadyAssigned { .. } => {
                ApiError::Conflict("Trip already assigned".into())
            }
            ErrorKind::AlreadyResponded { .. } => ApiError::Conflict(err.to_string()),
            ErrorKind::OfferExpired { .. } => ApiError::Gone(err.to_string()),
            ErrorKind::Precondition { ref kind } => match kind {
                PreconditionKind::NotApproved | PreconditionKind::UserInactive => {
                    ApiError::Forbidden(err.to_string())
                }
                PreconditionKind::AlreadyOnline
                | PreconditionKind::OnTrip
                | PreconditionKind::ActiveTripExists(_) => ApiError::Conflict(err.to_string()),
                _ => ApiError::Unprocessable(err.to_string()),
            },
            ErrorKind::OutOfService | ErrorKind::CrossCity => {
                ApiError::Validation(err.to_string())
            }
            ErrorKind::ConfigMissing { .. } => ApiError::Unprocessable(err.to_string()),
            ErrorKind::Internal(cause) => ApiError::Internal(cause),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let detail = e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "invalid value".to_string());
                    format!("{}: {}", field, detail)
                })
            })
            .collect();

        ApiError::Validation(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            status_of(ErrorKind::NotFound { entity: "trip", id: 1 }.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ErrorKind::AlreadyAssigned { trip_id: 1 }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ErrorKind::OfferExpired { attempt_id: 1 }.into()),
            StatusCode::GONE
        );
        assert_eq!(status_of(ErrorKind::OutOfService.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(ErrorKind::CrossCity.into()), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_precondition_mapping() {
        assert_eq!(
            status_of(ErrorKind::precondition(PreconditionKind::UserInactive).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ErrorKind::precondition(PreconditionKind::ActiveTripExists(5)).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ErrorKind::precondition(PreconditionKind::NoActiveFleet).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_assignment_loss_does_not_leak_winner() {
        let err: ApiError = ErrorKind::AlreadyAssigned { trip_id: 42 }.into();
        match err {
            ApiError::Conflict(msg) => assert_eq!(msg, "Trip already assigned"),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }
}
