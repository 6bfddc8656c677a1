//! HTTP error mapping.
//!
//! Every failure leaves as `{"error": "..."}` with exactly one status per
//! error kind. Server-side failures get a generic message; the detail
//! only reaches the log.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gatepass_core::error::GatepassError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(GatepassError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GatepassError::Validation { .. }
            | GatepassError::InvalidState { .. }
            | GatepassError::SelfDeletion => StatusCode::BAD_REQUEST,
            GatepassError::AuthenticationRequired | GatepassError::AuthenticationFailed { .. } => {
                StatusCode::UNAUTHORIZED
            }
            GatepassError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
            GatepassError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatepassError::AlreadyExists { .. } => StatusCode::CONFLICT,
            GatepassError::Database(_) | GatepassError::Crypto(_) | GatepassError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            GatepassError::Validation { message } => message.clone(),
            GatepassError::AuthenticationFailed { reason }
            | GatepassError::AuthorizationDenied { reason }
            | GatepassError::InvalidState { reason } => reason.clone(),
            GatepassError::NotFound { entity, .. } => format!("{entity} not found"),
            GatepassError::AlreadyExists { entity } => format!("{entity} already exists"),
            GatepassError::AuthenticationRequired | GatepassError::SelfDeletion => {
                self.0.to_string()
            }
            GatepassError::Database(_) | GatepassError::Crypto(_) | GatepassError::Internal(_) => {
                "internal server error".into()
            }
        }
    }
}

impl From<GatepassError> for ApiError {
    fn from(err: GatepassError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(GatepassError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(GatepassError::validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(GatepassError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_has_one_status() {
        let cases = [
            (GatepassError::validation("x"), StatusCode::BAD_REQUEST),
            (GatepassError::invalid_state("x"), StatusCode::BAD_REQUEST),
            (GatepassError::SelfDeletion, StatusCode::BAD_REQUEST),
            (GatepassError::AuthenticationRequired, StatusCode::UNAUTHORIZED),
            (
                GatepassError::AuthenticationFailed {
                    reason: "invalid token".into(),
                },
                StatusCode::UNAUTHORIZED,
            ),
            (GatepassError::denied("access denied"), StatusCode::FORBIDDEN),
            (GatepassError::not_found("permit", "1"), StatusCode::NOT_FOUND),
            (GatepassError::already_exists("permit"), StatusCode::CONFLICT),
            (
                GatepassError::Database("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn server_errors_hide_detail() {
        let err = ApiError::from(GatepassError::Database("connection reset by peer".into()));
        assert_eq!(err.message(), "internal server error");

        let err = ApiError::from(GatepassError::denied("cannot reopen this permit"));
        assert_eq!(err.message(), "cannot reopen this permit");
    }
}
