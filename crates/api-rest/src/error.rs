use crate::dto::{AncestorRes, ErrorRes, ViolationRes};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use mpr_core::ArchivalError;

/// HTTP face of [`ArchivalError`].
#[derive(Debug)]
pub enum ApiError {
    Archival(ArchivalError),
    /// The blocking worker running the operation panicked or was cancelled.
    Internal(String),
}

impl From<ArchivalError> for ApiError {
    fn from(err: ArchivalError) -> Self {
        ApiError::Archival(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Archival(ArchivalError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Archival(ArchivalError::PreconditionFailed { .. }) => StatusCode::CONFLICT,
            ApiError::Archival(ArchivalError::OperationFailed { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Archival(ArchivalError::InvariantViolation { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Archival(ArchivalError::InvalidInput(_) | ArchivalError::Uuid(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorRes {
        let err = match self {
            ApiError::Archival(err) => err,
            ApiError::Internal(message) => {
                return ErrorRes {
                    code: "internal".into(),
                    message,
                    retryable: false,
                    rows_changed: 0,
                    ancestor: None,
                    violations: None,
                }
            }
        };

        let mut body = ErrorRes {
            code: String::new(),
            message: err.to_string(),
            retryable: err.is_retryable(),
            rows_changed: err.rows_changed(),
            ancestor: None,
            violations: None,
        };
        body.code = match err {
            ArchivalError::NotFound(_) => "not_found",
            ArchivalError::PreconditionFailed { ancestor, .. } => {
                body.ancestor = Some(AncestorRes::from(ancestor));
                "ancestor_archived"
            }
            ArchivalError::OperationFailed { .. } => "operation_failed",
            ArchivalError::InvariantViolation { violations, .. } => {
                body.violations = Some(violations.iter().map(ViolationRes::from).collect());
                "invariant_violation"
            }
            ArchivalError::InvalidInput(_) | ArchivalError::Uuid(_) => "invalid_input",
        }
        .into();
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            StatusCode::SERVICE_UNAVAILABLE => tracing::warn!("request failed, retryable: {:?}", self),
            s if s.is_server_error() => tracing::error!("request failed: {:?}", self),
            _ => tracing::debug!("request rejected: {:?}", self),
        }
        (status, Json(self.body())).into_response()
    }
}
