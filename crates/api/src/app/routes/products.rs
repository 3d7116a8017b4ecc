use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use agristore_auth::AccessPolicy;
use agristore_catalog::{NewProduct, ProductPatch};
use agristore_core::ProductId;
use agristore_infra::services::Services;

use crate::app::dto::{self, ProductBody};
use crate::app::errors;
use crate::app::routes::guarded;
use crate::context::AuthContext;
use crate::middleware::AuthState;

pub fn router(auth: &AuthState) -> Router {
    let public = guarded(
        Router::new()
            .route("/", get(list_products))
            .route("/:id", get(get_product)),
        auth,
        AccessPolicy::Optional,
    );
    let admin = guarded(
        Router::new()
            .route("/", post(create_product))
            .route("/:id", put(update_product).delete(delete_product)),
        auth,
        AccessPolicy::Admin,
    );
    public.merge(admin)
}

pub async fn list_products(
    Extension(services): Extension<Arc<Services>>,
    caller: Option<Extension<AuthContext>>,
    query: Result<Query<dto::ListProductsQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let is_admin = caller.is_some_and(|Extension(c)| c.is_admin());
    let (filter, page) = query.into_parts(is_admin);

    match services.products.list(filter, page).await {
        Ok(page) => (StatusCode::OK, Json(dto::ProductList::from(page))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.products.get(id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<Services>>,
    body: ProductBody<NewProduct>,
) -> axum::response::Response {
    match services.products.create(body.input, body.files).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
    body: ProductBody<ProductPatch>,
) -> axum::response::Response {
    let id: ProductId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.products.update(id, body.input, body.files).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.products.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "product deleted" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
