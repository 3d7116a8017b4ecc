use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use agristore_auth::{AccessPolicy, Registration};
use agristore_infra::services::Services;

use crate::app::routes::guarded;
use crate::app::{dto, errors};
use crate::context::AuthContext;
use crate::middleware::AuthState;

pub fn router(auth: &AuthState) -> Router {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));
    let authenticated = guarded(
        Router::new().route("/profile", get(profile)),
        auth,
        AccessPolicy::Authenticated,
    );
    public.merge(authenticated)
}

pub async fn register(
    Extension(services): Extension<Arc<Services>>,
    body: Result<Json<Registration>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    match services.auth.register(body).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<Services>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    match services.auth.login(&body.email, &body.password).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn profile(
    Extension(services): Extension<Arc<Services>>,
    Extension(caller): Extension<AuthContext>,
) -> axum::response::Response {
    match services.auth.profile(caller.user_id()).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
