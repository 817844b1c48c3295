//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services/`: business rules over the repositories and blob store
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response bodies
//! - `extract.rs`, `form.rs`: request parsing with API-shaped rejections
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, extract::DefaultBodyLimit, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use skillsgarden_core::validation::MAX_IMAGE_BYTES;
use skillsgarden_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod form;
pub mod routes;
pub mod services;

/// Headroom over the image limit for the other multipart fields, so an
/// oversized image is reported by the form validation.
const BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(router(services))
}

/// Router over already-built services.
pub fn router(services: services::AppServices) -> Router {
    let auth_state = middleware::AuthState {
        jwt: Arc::new(services.tokens.clone()),
    };

    let api = routes::router()
        .layer(Extension(Arc::new(services)))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
}
