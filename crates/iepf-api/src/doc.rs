//! OpenAPI documentation
//!
//! [`ApiDoc`] collects every route and schema of the API and registers the
//! bearer token security scheme. It is served at `/api-docs/openapi.json`
//! and rendered by Swagger UI at `/swagger-ui`.

use crate::auth::{LoginRequest, RefreshRequest, TokenPair};
use crate::error::{ApiError, ValidationErrorDetail, ValidationErrorResponse, ValidationIssue};
use crate::handlers::health::HealthResponse;
use crate::handlers::users::{CreateUserRequest, UpdateUserRequest};
use iepf_core::{UserPublic, UserRole};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the `bearer_auth` security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token issued by POST /auth/login"))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "iepf API",
        description = "User accounts and session authentication.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login_handler,
        crate::handlers::auth::refresh_handler,
        crate::handlers::users::list_users,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
    ),
    components(schemas(
        HealthResponse,
        LoginRequest,
        RefreshRequest,
        TokenPair,
        UserPublic,
        UserRole,
        CreateUserRequest,
        UpdateUserRequest,
        ApiError,
        ValidationIssue,
        ValidationErrorDetail,
        ValidationErrorResponse,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Login and token refresh"),
        (name = "users", description = "User account management")
    )
)]
pub struct ApiDoc;
