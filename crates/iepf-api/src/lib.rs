//! iepf API - REST server
//!
//! Provides HTTP endpoints for user account management and session
//! authentication: login, single-use refresh token rotation and bearer
//! access tokens.

pub mod audit;
pub mod auth;
pub mod doc;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod seed;
pub mod state;

use axum::Router;
use doc::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the complete application router
///
/// Security headers cover the API routes; Swagger UI is served without them
/// since it needs to load its own scripts and styles.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = middleware::cors_layer(&state.config.server.cors_origins);

    routes::api_routes(state.clone())
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(routes::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Router over an in-memory store with fast password hashing
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    create_router(testing::test_state())
}

#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    //! Fixtures for router-level tests

    use crate::auth::password::PasswordConfig;
    use crate::state::AppState;
    use iepf_core::{AppConfig, InMemoryStore};
    use std::sync::Arc;

    /// Signing secret of [`test_config`]
    pub const TEST_JWT_SECRET: &str = "test-secret-key-with-at-least-32-bytes";

    /// Valid configuration with test secrets
    pub fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = TEST_JWT_SECRET.to_string();
        config.auth.password_salt = "test-pepper".to_string();
        config
    }

    /// State over a fresh in-memory store
    pub fn test_state() -> Arc<AppState> {
        test_state_with(test_config())
    }

    /// State over a fresh in-memory store with the given configuration
    pub fn test_state_with(config: AppConfig) -> Arc<AppState> {
        let store = Arc::new(InMemoryStore::new());
        Arc::new(AppState::with_password_config(
            config,
            store.clone(),
            store,
            PasswordConfig::fast(),
        ))
    }
}
