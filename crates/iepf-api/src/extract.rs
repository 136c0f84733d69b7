//! Request extractors that reject with the validation envelope
//!
//! Malformed bodies, failed `validator` rules and non-UUID path ids all
//! answer 422 with a list of issues instead of axum's plain-text rejections.

use crate::error::{AppError, ValidationIssue};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Key under which `validator` files struct-level errors
const STRUCT_LEVEL: &str = "__all__";

/// JSON body that has passed its `validator` rules
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(body_rejection)?;

        value
            .validate()
            .map_err(|errors| AppError::Validation(validation_issues(&errors)))?;

        Ok(Self(value))
    }
}

/// The `{id}` segment of a user route, parsed as a UUID
#[derive(Debug, Clone, Copy)]
pub struct IdParam(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for IdParam
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Internal(e.body_text()))?;

        Uuid::parse_str(&raw).map(Self).map_err(|_| {
            AppError::Validation(vec![ValidationIssue::new(
                "invalid_format",
                ["id"],
                "Invalid UUID",
            )])
        })
    }
}

fn body_rejection(rejection: JsonRejection) -> AppError {
    AppError::Validation(vec![ValidationIssue::new(
        "invalid_body",
        Vec::<String>::new(),
        rejection.body_text(),
    )])
}

/// Flatten `validator` errors into issues, ordered by field
pub fn validation_issues(errors: &ValidationErrors) -> Vec<ValidationIssue> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            let path: Vec<String> = if field == STRUCT_LEVEL {
                Vec::new()
            } else {
                vec![field.to_string()]
            };

            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", path.join(".")));
                ValidationIssue::new(error.code.to_string(), path.clone(), message)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 3, message = "Name must be 1 to 3 characters"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_issues_are_ordered_by_field() {
        let sample = Sample {
            name: String::new(),
            email: "nope".to_string(),
        };

        let issues = validation_issues(&sample.validate().unwrap_err());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].path, vec!["email"]);
        assert_eq!(issues[0].code, "email");
        assert_eq!(issues[1].path, vec!["name"]);
        assert_eq!(issues[1].message, "Name must be 1 to 3 characters");
    }

    #[test]
    fn test_valid_input_has_no_issues() {
        let sample = Sample {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        };
        assert!(sample.validate().is_ok());
    }
}
