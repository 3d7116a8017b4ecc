//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend selection and service construction
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs, query parsing, multipart product forms
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use agristore_infra::uploads::PUBLIC_PREFIX;

use crate::config::AppConfig;
use crate::middleware::AuthState;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let (services, jwt) = services::build_services(config).await?;
    let auth = AuthState::new(jwt);

    let origin = HeaderValue::from_str(&config.frontend_url)
        .with_context(|| format!("invalid FRONTEND_URL '{}'", config.frontend_url))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let api = routes::router(&auth).layer(Extension(Arc::new(services)));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .nest_service(
            &format!("/{PUBLIC_PREFIX}"),
            ServeDir::new(&config.upload_root),
        )
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(config.max_body_bytes)),
        ))
}
