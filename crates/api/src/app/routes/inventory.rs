use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use agristore_auth::AccessPolicy;
use agristore_core::ProductId;
use agristore_infra::services::Services;

use crate::app::routes::guarded;
use crate::app::{dto, errors};
use crate::middleware::AuthState;

pub fn router(auth: &AuthState) -> Router {
    guarded(
        Router::new()
            .route("/:id/stock", put(update_stock))
            .route("/low-stock", get(low_stock))
            .route("/summary", get(stock_summary)),
        auth,
        AccessPolicy::Admin,
    )
}

pub async fn update_stock(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateStockRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ProductId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    match services.inventory.update_stock(id, body.stock).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn low_stock(
    Extension(services): Extension<Arc<Services>>,
    query: Result<Query<dto::LowStockQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    match services.inventory.low_stock(query.threshold).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn stock_summary(
    Extension(services): Extension<Arc<Services>>,
) -> axum::response::Response {
    match services.inventory.summary().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
