use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use agristore_auth::AccessPolicy;
use agristore_core::SaleId;
use agristore_infra::services::Services;
use agristore_sales::{ExportFormat, NewSale, Period};

use crate::app::routes::guarded;
use crate::app::{dto, errors};
use crate::middleware::AuthState;

pub fn router(auth: &AuthState) -> Router {
    guarded(
        Router::new()
            .route("/", get(list_sales).post(create_sale))
            .route("/summary", get(sales_summary))
            .route("/by-product", get(sales_by_product))
            .route("/export", get(export_sales))
            .route("/:id", get(get_sale)),
        auth,
        AccessPolicy::Admin,
    )
}

fn resolve_period(
    query: Result<Query<dto::PeriodQuery>, QueryRejection>,
) -> Result<Period, axum::response::Response> {
    let Query(query) = query.map_err(|e| errors::bad_request(e.body_text()))?;
    query.period().map_err(errors::domain_error_to_response)
}

pub async fn create_sale(
    Extension(services): Extension<Arc<Services>>,
    body: Result<Json<NewSale>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    match services.sales.create(body).await {
        Ok(sale) => (StatusCode::CREATED, Json(sale)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_sale(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SaleId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.sales.get(id).await {
        Ok(sale) => (StatusCode::OK, Json(sale)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_sales(
    Extension(services): Extension<Arc<Services>>,
    query: Result<Query<dto::SalesQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let (filter, page) = match query.into_parts() {
        Ok(parts) => parts,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.sales.list(filter, page).await {
        Ok(page) => (StatusCode::OK, Json(dto::SaleList::from(page))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn sales_summary(
    Extension(services): Extension<Arc<Services>>,
    query: Result<Query<dto::PeriodQuery>, QueryRejection>,
) -> axum::response::Response {
    let period = match resolve_period(query) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match services.sales.summary(&period).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn sales_by_product(
    Extension(services): Extension<Arc<Services>>,
    query: Result<Query<dto::PeriodQuery>, QueryRejection>,
) -> axum::response::Response {
    let period = match resolve_period(query) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match services.sales.by_product(&period).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn export_sales(
    Extension(services): Extension<Arc<Services>>,
    query: Result<Query<dto::PeriodQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let format: ExportFormat = match query.format.as_deref().unwrap_or("csv").parse() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let period = match query.period() {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.sales.export(&period, format).await {
        Ok(export) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, export.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", export.filename),
                ),
            ],
            export.body,
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
