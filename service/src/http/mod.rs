//! HTTP router assembly and middleware.
//!
//! [`build_router`] is shared by `main.rs` and the integration tests so both
//! run the same wiring.

pub mod security;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::build_info::BuildInfo;
use crate::config::Config;
use crate::portal::{BulletinSync, MemberDirectory};
use crate::rest::{self, ApiDoc};

pub use security::{build_security_headers, security_headers_middleware};

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Routes mounted under `/api/v1`.
fn api_routes() -> Router {
    Router::new()
        .route("/build-info", get(rest::get_build_info))
        .route("/members", get(rest::list_members))
        .route("/members/search", get(rest::search_members))
        .route("/members/{t_number}", get(rest::get_member))
        .route(
            "/communities/{community}/members",
            get(rest::community_members),
        )
        .route("/contacts/emails", get(rest::email_contacts))
        .route("/contacts/phones", get(rest::phone_contacts))
        .route("/portal/status", get(rest::portal_status))
        .route("/bulletins/sync", post(rest::sync_bulletin))
}

/// Translate configured origins into a CORS origin policy.
#[must_use]
pub fn allow_origin(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow any origin - not recommended for production");
        AllowOrigin::any()
    } else if origins.is_empty() {
        tracing::info!(
            "CORS allowed origins not configured - cross-origin requests will be blocked"
        );
        AllowOrigin::list(Vec::<HeaderValue>::new())
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        tracing::info!(origins = ?origins, "CORS allowed origins configured");
        AllowOrigin::list(parsed)
    }
}

/// Build the full application router.
pub fn build_router(
    directory: Arc<MemberDirectory>,
    bulletins: Arc<BulletinSync>,
    build_info: BuildInfo,
    config: &Config,
) -> Router {
    let mut app = Router::new()
        .nest("/api/v1", api_routes())
        .route("/health", get(health_check));

    if config.swagger.enabled {
        tracing::info!("Swagger UI enabled at /swagger-ui");
        app = app.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }

    app = app
        .layer(Extension(directory))
        .layer(Extension(bulletins))
        .layer(Extension(build_info))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .allow_origin(allow_origin(&config.cors.allowed_origins)),
        )
        .layer(TraceLayer::new_for_http());

    if config.security_headers.enabled {
        app = app
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(Extension(build_security_headers(&config.security_headers)));
    }

    app
}
