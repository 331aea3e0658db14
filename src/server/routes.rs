//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    http::{HeaderName, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api::{health, home, users};
use crate::config::CorsConfig;
use crate::middleware::{log_request, require_jwt, REQUEST_ID_HEADER, TRACE_ID_HEADER};
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Health check routes (no authentication required)
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/liveness", get(health::liveness));

    let public_routes = Router::new()
        .route("/", get(home::home))
        .route("/signup", post(users::signup))
        .route("/login", post(users::login));

    let protected_routes = Router::new()
        .route("/me", get(users::me))
        .layer(middleware::from_fn_with_state(state.auth_state(), require_jwt));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(health_routes)
        // Last added = outermost: logging wraps CORS
        .layer(create_cors_layer(&state.settings.cors))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// CORS layer: any origin unless `CORS_ORIGINS` lists specific ones
fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static(TRACE_ID_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}
