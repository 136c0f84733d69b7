//! User management API handlers
//!
//! Listing, creating and deleting accounts is reserved to administrators.
//! Reading and patching an account is allowed to its owner as well.

use crate::audit::{audit_log, AuditEvent};
use crate::auth::policy::{self, Forbidden};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::{IdParam, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use iepf_core::{IepfError, NewUser, UserChanges, UserPublic, UserRole};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Create user request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserRequest {
    #[validate(
        email(message = "Invalid email address"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    #[schema(example = "jordan@example.com")]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    #[schema(example = "Jordan")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    #[schema(example = "Developer")]
    pub last_name: String,
    #[validate(length(min = 8, max = 200, message = "Password must be 8 to 200 characters"))]
    pub password: String,
}

/// Partial user update request; at least one field is required
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "require_any_change"))]
pub struct UpdateUserRequest {
    #[validate(
        email(message = "Invalid email address"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: Option<String>,
    #[validate(length(min = 8, max = 200, message = "Password must be 8 to 200 characters"))]
    pub password: Option<String>,
}

fn require_any_change(request: &UpdateUserRequest) -> Result<(), ValidationError> {
    if request.email.is_none()
        && request.first_name.is_none()
        && request.last_name.is_none()
        && request.password.is_none()
    {
        let mut error = ValidationError::new("invalid_updates");
        error.message = Some(Cow::Borrowed("No updates provided"));
        return Err(error);
    }
    Ok(())
}

/// Turn a policy decision into a response, auditing denials
fn authorize(
    decision: Result<(), Forbidden>,
    identity: Option<&AuthenticatedUser>,
    resource: &str,
    required_role: Option<UserRole>,
) -> Result<(), AppError> {
    decision.map_err(|forbidden| {
        audit_log(&AuditEvent::AccessDenied {
            user_id: identity.map(|i| i.id),
            email: identity.map(|i| i.email.clone()),
            resource: resource.to_string(),
            required_role: required_role.map(|r| r.to_string()),
        });
        AppError::from(forbidden)
    })
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = [UserPublic]),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an administrator", body = crate::error::ApiError),
    )
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    authorize(
        policy::require_admin(&identity),
        Some(&identity),
        "GET /users",
        Some(UserRole::Admin),
    )?;

    let users: Vec<UserPublic> = state
        .users
        .list_users()
        .await?
        .iter()
        .map(|user| user.to_public())
        .collect();

    Ok(Json(users))
}

/// Create a user
///
/// New accounts always get the `user` role.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserPublic,
            headers(("Location" = String, description = "Path of the new user"))),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an administrator", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ValidationErrorResponse),
        (status = 422, description = "Invalid input", body = crate::error::ValidationErrorResponse),
    )
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize(
        policy::require_admin(&identity),
        Some(&identity),
        "POST /users",
        Some(UserRole::Admin),
    )?;

    if state.users.find_by_email(&request.email).await?.is_some() {
        return Err(IepfError::duplicate_email().into());
    }

    let password_hash = state.passwords.hash(&request.password).await?;

    // The unique constraint still decides if a concurrent insert won
    let user = state
        .users
        .create_user(NewUser {
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
            role: UserRole::User,
        })
        .await?;

    audit_log(&AuditEvent::UserCreated {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        created_by: identity.id,
    });

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/users/{}", user.id))],
        Json(user.to_public()),
    ))
}

/// Get one user
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserPublic),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Neither the owner nor an administrator", body = crate::error::ApiError),
        (status = 404, description = "No such user", body = crate::error::ApiError),
        (status = 422, description = "Invalid id", body = crate::error::ValidationErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    identity: Option<Extension<AuthenticatedUser>>,
    IdParam(id): IdParam,
) -> Result<impl IntoResponse, AppError> {
    let identity = identity.map(|Extension(identity)| identity);
    authorize(
        policy::require_self_or_admin(identity.as_ref(), id),
        identity.as_ref(),
        &format!("GET /users/{id}"),
        None,
    )?;

    let user = state.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;

    Ok(Json(user.to_public()))
}

/// Update a user
///
/// Changing the password revokes every refresh token of the account.
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = uuid::Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "The updated user", body = UserPublic),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Neither the owner nor an administrator", body = crate::error::ApiError),
        (status = 404, description = "No such user", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ValidationErrorResponse),
        (status = 422, description = "Invalid input", body = crate::error::ValidationErrorResponse),
    )
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    identity: Option<Extension<AuthenticatedUser>>,
    IdParam(id): IdParam,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = identity.map(|Extension(identity)| identity);
    authorize(
        policy::require_self_or_admin(identity.as_ref(), id),
        identity.as_ref(),
        &format!("PATCH /users/{id}"),
        None,
    )?;

    if let Some(email) = &request.email {
        if let Some(existing) = state.users.find_by_email(email).await? {
            if existing.id != id {
                return Err(IepfError::duplicate_email().into());
            }
        }
    }

    let password_hash = match &request.password {
        Some(password) => Some(state.passwords.hash(password).await?),
        None => None,
    };

    let changes = UserChanges {
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        password_hash,
    };
    let changes_password = changes.changes_password();

    let user = state
        .users
        .update_user(id, changes)
        .await?
        .ok_or(AppError::NotFound)?;

    if changes_password {
        let revoked = state.refresh_tokens.revoke_all_for_user(user.id).await?;
        audit_log(&AuditEvent::SessionsRevoked {
            user_id: user.id,
            revoked,
            changed_by: identity.as_ref().map(|i| i.id).unwrap_or(user.id),
        });
    }

    Ok(Json(user.to_public()))
}

/// Delete a user
///
/// The user's refresh tokens go with it.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Caller is not an administrator", body = crate::error::ApiError),
        (status = 404, description = "No such user", body = crate::error::ApiError),
        (status = 422, description = "Invalid id", body = crate::error::ValidationErrorResponse),
    )
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    IdParam(id): IdParam,
) -> Result<impl IntoResponse, AppError> {
    authorize(
        policy::require_admin(&identity),
        Some(&identity),
        &format!("DELETE /users/{id}"),
        Some(UserRole::Admin),
    )?;

    if !state.users.delete_user(id).await? {
        return Err(AppError::NotFound);
    }

    audit_log(&AuditEvent::UserDeleted {
        user_id: id,
        deleted_by: identity.id,
    });

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateUserRequest {
        CreateUserRequest {
            email: "jordan@example.com".to_string(),
            first_name: "Jordan".to_string(),
            last_name: "Developer".to_string(),
            password: "Sup3rSecret".to_string(),
        }
    }

    #[test]
    fn test_create_request_rules() {
        assert!(create_request().validate().is_ok());

        let mut long_email = create_request();
        long_email.email = format!("{}@example.com", "a".repeat(95));
        assert!(long_email.validate().is_err());

        let mut empty_name = create_request();
        empty_name.first_name = String::new();
        assert!(empty_name.validate().is_err());

        let mut short_password = create_request();
        short_password.password = "short".to_string();
        assert!(short_password.validate().is_err());

        let mut long_password = create_request();
        long_password.password = "x".repeat(201);
        assert!(long_password.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_unknown_fields() {
        let result: Result<CreateUserRequest, _> = serde_json::from_value(serde_json::json!({
            "email": "jordan@example.com",
            "firstName": "Jordan",
            "lastName": "Developer",
            "password": "Sup3rSecret",
            "role": "admin"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_update_is_invalid() {
        let errors = UpdateUserRequest::default().validate().unwrap_err();
        let issues = crate::extract::validation_issues(&errors);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "invalid_updates");
        assert!(issues[0].path.is_empty());
        assert_eq!(issues[0].message, "No updates provided");
    }

    #[test]
    fn test_partial_update_is_valid() {
        let request = UpdateUserRequest {
            first_name: Some("Jordan".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        let bad_password = UpdateUserRequest {
            password: Some("short".to_string()),
            ..Default::default()
        };
        assert!(bad_password.validate().is_err());
    }
}
