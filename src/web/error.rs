//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::{Violation, ViolationKind};
use crate::login::LoginError;
use crate::role::Role;

/// JSON error body shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Short, stable headline.
    pub error: String,
    /// Machine-readable code.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
    /// Request id, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Roles the endpoint accepts; only on `forbidden`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_roles: Option<Vec<Role>>,
    /// Role the caller holds; only on `forbidden`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_role: Option<Role>,
}

/// Status code plus JSON body.
#[derive(Debug)]
pub struct ApiError {
    /// Response status.
    pub status: StatusCode,
    /// Response body.
    pub body: ErrorBody,
}

impl ApiError {
    /// Attaches the request id to the body.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.body.request_id = Some(request_id.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for a violation kind.
pub fn status_for(kind: &ViolationKind) -> StatusCode {
    match kind {
        ViolationKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ViolationKind::NotFound => StatusCode::NOT_FOUND,
        ViolationKind::Forbidden(_) => StatusCode::FORBIDDEN,
        ViolationKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<Violation> for ApiError {
    fn from(violation: Violation) -> Self {
        let status = status_for(&violation.kind);
        let (required_roles, actual_role) = match violation.denial() {
            Some(denial) => (
                Some(denial.required.roles().to_vec()),
                Some(denial.actual.clone()),
            ),
            None => (None, None),
        };
        ApiError {
            status,
            body: ErrorBody {
                error: "Access denied".to_owned(),
                code: violation.code().to_owned(),
                message: violation.message,
                request_id: None,
                required_roles,
                actual_role,
            },
        }
    }
}

impl IntoResponse for Violation {
    fn into_response(self) -> axum::response::Response {
        ApiError::from(self).into_response()
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        let (status, code) = match err {
            LoginError::MissingPassword => (StatusCode::BAD_REQUEST, "missing_password"),
            LoginError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
        };
        ApiError {
            status,
            body: ErrorBody {
                error: capitalize(&err.to_string()),
                code: code.to_owned(),
                message: err.to_string(),
                request_id: None,
                required_roles: None,
                actual_role: None,
            },
        }
    }
}

/// Builds a 400 error for a malformed request body.
pub fn bad_request(message: impl Into<String>) -> ApiError {
    let message = message.into();
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: ErrorBody {
            error: "Bad request".to_owned(),
            code: "bad_request".to_owned(),
            message,
            request_id: None,
            required_roles: None,
            actual_role: None,
        },
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
