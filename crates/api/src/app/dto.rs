use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request},
    http::{StatusCode, header},
    response::Response,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use agristore_catalog::{NewProduct, Product, ProductFilter, ProductPatch};
use agristore_core::{DomainError, DomainResult, Page, PageRequest, Patch, ProductId};
use agristore_infra::uploads::IncomingFile;
use agristore_sales::{Period, Sale, SaleFilter, parse_date};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub stock: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl ListProductsQuery {
    /// Non-admin callers only ever see active products.
    pub fn into_parts(self, is_admin: bool) -> (ProductFilter, PageRequest) {
        let is_active = if is_admin { self.is_active } else { Some(true) };
        let filter = ProductFilter {
            category: self.category,
            brand: self.brand,
            min_price: self.min_price,
            max_price: self.max_price,
            is_active,
            search: self.search,
        };
        (filter, PageRequest::new(self.page, self.limit))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SalesQuery {
    pub product_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SalesQuery {
    pub fn into_parts(self) -> DomainResult<(SaleFilter, PageRequest)> {
        let product_id = non_blank(self.product_id)
            .map(|id| ProductId::from_str(&id))
            .transpose()?;
        let from = optional_date(self.from)?;
        let to = optional_date(self.to)?;
        if let (Some(from), Some(to)) = (from, to) {
            Period::new(from, to)?;
        }
        Ok((
            SaleFilter::from_dates(product_id, from, to),
            PageRequest::new(self.page, self.limit),
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub format: Option<String>,
}

impl PeriodQuery {
    /// Resolve against today's UTC date.
    pub fn period(&self) -> DomainResult<Period> {
        let from = optional_date(self.from.clone())?;
        let to = optional_date(self.to.clone())?;
        Period::resolve(from, to, chrono::Utc::now().date_naive())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn optional_date(value: Option<String>) -> DomainResult<Option<chrono::NaiveDate>> {
    non_blank(value).map(|d| parse_date(&d)).transpose()
}

pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl From<Page<Product>> for ProductList {
    fn from(page: Page<Product>) -> Self {
        Self {
            products: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleList {
    pub sales: Vec<Sale>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl From<Page<Sale>> for SaleList {
    fn from(page: Page<Sale>) -> Self {
        Self {
            sales: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
        }
    }
}

// -------------------------
// Product bodies (JSON or multipart)
// -------------------------

/// Text fields of a multipart form.
#[derive(Debug, Default)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    fn text(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    fn string(&self, name: &str) -> String {
        self.text(name).unwrap_or_default().to_string()
    }

    fn parse<T: FromStr>(&self, name: &str) -> DomainResult<Option<T>> {
        match self.text(name).map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| DomainError::validation(format!("{name} has an invalid value '{v}'"))),
        }
    }

    /// Comma separated; blanks dropped.
    fn url_list(&self, name: &str) -> Option<Vec<String>> {
        self.text(name)
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.split(',').map(str::trim).filter(|u| !u.is_empty()).map(str::to_string).collect())
    }

    fn patch<T: FromStr>(&self, name: &str) -> DomainResult<Patch<T>> {
        Ok(self.parse(name)?.into())
    }
}

/// Product input types that can also be built from multipart text fields.
pub trait FromFormFields: Sized {
    fn from_fields(fields: &FormFields) -> DomainResult<Self>;
}

impl FromFormFields for NewProduct {
    fn from_fields(fields: &FormFields) -> DomainResult<Self> {
        Ok(NewProduct {
            name: fields.string("name"),
            description: fields.string("description"),
            price: fields.parse("price")?.unwrap_or_default(),
            category: fields.string("category"),
            brand: fields.string("brand"),
            stock: fields.parse("stock")?.unwrap_or_default(),
            is_active: fields.parse("is_active")?,
            image_urls: fields.url_list("image_urls").unwrap_or_default(),
            image_url: fields.text("image_url").map(str::to_string),
        })
    }
}

impl FromFormFields for ProductPatch {
    fn from_fields(fields: &FormFields) -> DomainResult<Self> {
        let text = |name: &str| Patch::from(fields.text(name).map(str::to_string));
        Ok(ProductPatch {
            name: text("name"),
            description: text("description"),
            price: fields.patch("price")?,
            category: text("category"),
            brand: text("brand"),
            stock: fields.patch("stock")?,
            is_active: fields.patch("is_active")?,
            image_urls: fields.url_list("image_urls").into(),
            image_url: text("image_url"),
        })
    }
}

/// Multipart file field carrying product images.
pub const IMAGE_FIELD: &str = "images";

/// A product body: JSON, or a multipart form with optional image files.
#[derive(Debug)]
pub struct ProductBody<T> {
    pub input: T,
    pub files: Vec<IncomingFile>,
}

#[axum::async_trait]
impl<S, T> FromRequest<S> for ProductBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + FromFormFields + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(input) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| errors::bad_request(e.body_text()))?;
            return Ok(Self {
                input,
                files: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| errors::bad_request(e.body_text()))?;

        let mut fields = FormFields::default();
        let mut files = Vec::new();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) if name == IMAGE_FIELD => {
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    if filename.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    files.push(IncomingFile {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                Some(_) => {}
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    fields.0.insert(name, value);
                }
            }
        }

        let input = T::from_fields(&fields).map_err(errors::domain_error_to_response)?;
        Ok(Self { input, files })
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> Response {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return errors::json_error(StatusCode::PAYLOAD_TOO_LARGE, "too_large", err.body_text());
    }
    errors::bad_request(err.body_text())
}
