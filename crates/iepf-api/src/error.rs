//! API error handling
//!
//! Every failure leaving a handler is an [`AppError`]. Plain failures answer
//! with `{"message": "<reason phrase>"}`; validation and conflict failures
//! answer with the issue envelope:
//!
//! ```json
//! {
//!   "success": false,
//!   "error": {
//!     "name": "ValidationError",
//!     "issues": [{ "code": "duplicate_key", "path": ["email"], "message": "..." }]
//!   }
//! }
//! ```
//!
//! Internal details are logged, never returned.

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::auth::policy::Forbidden;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use iepf_core::IepfError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Issue code of a duplicate unique key
pub const DUPLICATE_KEY: &str = "duplicate_key";

/// Plain error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// HTTP reason phrase
    #[schema(example = "Unauthorized")]
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One problem with the request input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    /// Machine readable code
    #[schema(example = "duplicate_key")]
    pub code: String,
    /// Location of the offending value; empty for the whole body
    pub path: Vec<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        code: impl Into<String>,
        path: impl IntoIterator<Item = impl Into<String>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }
}

/// Issue list with its error name
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorDetail {
    #[schema(example = "ValidationError")]
    pub name: String,
    pub issues: Vec<ValidationIssue>,
}

/// Envelope for 409 and 422 responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub success: bool,
    pub error: ValidationErrorDetail,
}

impl ValidationErrorResponse {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self {
            success: false,
            error: ValidationErrorDetail {
                name: "ValidationError".to_string(),
                issues,
            },
        }
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict(ValidationIssue),
    Validation(Vec<ValidationIssue>),
    Internal(String),
    Database(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let phrase = status.canonical_reason().unwrap_or("Error");

        match self {
            AppError::Conflict(issue) => {
                (status, Json(ValidationErrorResponse::new(vec![issue]))).into_response()
            }
            AppError::Validation(issues) => {
                (status, Json(ValidationErrorResponse::new(issues))).into_response()
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                (status, Json(ApiError::new(phrase))).into_response()
            }
            AppError::Database(detail) => {
                tracing::error!(error = %detail, "Database error");
                (status, Json(ApiError::new(phrase))).into_response()
            }
            AppError::Unauthorized | AppError::Forbidden | AppError::NotFound => {
                (status, Json(ApiError::new(phrase))).into_response()
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<Forbidden> for AppError {
    fn from(_: Forbidden) -> Self {
        AppError::Forbidden
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Only signing can fail on the handler path; verification failures are
/// handled by the middleware.
impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<IepfError> for AppError {
    fn from(err: IepfError) -> Self {
        match err {
            IepfError::NotFound(_) => AppError::NotFound,
            IepfError::Conflict { field, message } => {
                AppError::Conflict(ValidationIssue::new(DUPLICATE_KEY, [field], message))
            }
            IepfError::ValidationError(msg) => {
                AppError::Validation(vec![ValidationIssue::new("invalid", Vec::<String>::new(), msg)])
            }
            IepfError::DatabaseError(msg) => AppError::Database(msg),
            IepfError::ConfigError(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            IepfError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_plain_errors_use_reason_phrase() {
        let cases = [
            (AppError::Unauthorized, 401, "Unauthorized"),
            (AppError::Forbidden, 403, "Forbidden"),
            (AppError::NotFound, 404, "Not Found"),
            (
                AppError::Internal("secret detail".to_string()),
                500,
                "Internal Server Error",
            ),
            (
                AppError::Database("connection refused".to_string()),
                500,
                "Internal Server Error",
            ),
        ];

        for (error, status, message) in cases {
            let response = error.into_response();
            assert_eq!(response.status().as_u16(), status);
            assert_eq!(body_json(response).await, json!({ "message": message }));
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_envelope() {
        let response = AppError::from(IepfError::duplicate_email()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "error": {
                    "name": "ValidationError",
                    "issues": [{
                        "code": "duplicate_key",
                        "path": ["email"],
                        "message": "A user with this email already exists"
                    }]
                }
            })
        );
    }

    #[tokio::test]
    async fn test_validation_errors_are_unprocessable() {
        let response = AppError::Validation(vec![ValidationIssue::new(
            "length",
            ["password"],
            "Password must be 8 to 200 characters",
        )])
        .into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["issues"][0]["path"], json!(["password"]));
    }

    #[test]
    fn test_core_error_mapping() {
        assert!(matches!(
            AppError::from(IepfError::NotFound("user".to_string())),
            AppError::NotFound
        ));
        assert!(matches!(
            AppError::from(IepfError::DatabaseError("boom".to_string())),
            AppError::Database(_)
        ));
        assert!(matches!(
            AppError::from(IepfError::Other(anyhow::anyhow!("boom"))),
            AppError::Internal(_)
        ));
    }
}
