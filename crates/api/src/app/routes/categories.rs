use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use agristore_auth::AccessPolicy;
use agristore_catalog::NewCategory;
use agristore_core::CategoryId;
use agristore_infra::services::Services;

use crate::app::routes::guarded;
use crate::app::{dto, errors};
use crate::middleware::AuthState;

pub fn router(auth: &AuthState) -> Router {
    let public = Router::new()
        .route("/", get(list_categories))
        .route("/:id", get(get_category));
    let admin = guarded(
        Router::new()
            .route("/", post(create_category))
            .route("/:id", delete(delete_category)),
        auth,
        AccessPolicy::Admin,
    );
    public.merge(admin)
}

pub async fn list_categories(
    Extension(services): Extension<Arc<Services>>,
) -> axum::response::Response {
    match services.categories.list().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.categories.get(id).await {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_category(
    Extension(services): Extension<Arc<Services>>,
    body: Result<Json<NewCategory>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    match services.categories.create(body).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.categories.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "category deleted" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
