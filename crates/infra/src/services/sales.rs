//! Recording sales and reporting over them.

use std::sync::Arc;

use chrono::Utc;

use agristore_core::{DomainError, Page, PageRequest, ProductId, SaleId};
use agristore_sales::{
    ExportFormat, NewSale, Period, ProductSales, Sale, SaleFilter, SalesSummary, export_filename,
    name_rollups, resolve_price, write_csv,
};

use super::{ServiceError, ServiceResult};
use crate::store::{ProductRepository, SaleRepository, StockDecrement};

/// Attempts made to hand reserved stock back after a failed sale write.
const RELEASE_ATTEMPTS: usize = 3;

/// A rendered export ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesExport {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Clone)]
pub struct SalesService {
    sales: Arc<dyn SaleRepository>,
    products: Arc<dyn ProductRepository>,
}

impl SalesService {
    pub fn new(sales: Arc<dyn SaleRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { sales, products }
    }

    /// Record a sale at the catalog price.
    ///
    /// Stock is reserved with a conditional decrement before the sale is
    /// written, so two concurrent sales can never oversell. If the sale write
    /// then fails, the reservation is released again.
    pub async fn create(&self, input: NewSale) -> ServiceResult<Sale> {
        let quantity = input.validate()?;
        let product = self
            .products
            .get(input.product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("product"))?;
        let price = resolve_price(input.price, product.price)?;

        let now = Utc::now();
        match self.products.decrement_stock(product.id, quantity, now).await? {
            StockDecrement::Applied { .. } => {}
            StockDecrement::Insufficient { available } => {
                return Err(DomainError::InsufficientStock {
                    requested: quantity,
                    available,
                }
                .into());
            }
            StockDecrement::Missing => return Err(DomainError::not_found("product").into()),
        }

        let sale = Sale::record(product.id, quantity, price, now);
        if let Err(e) = self.sales.insert(&sale).await {
            tracing::warn!(product_id = %product.id, quantity, error = %e, "sale write failed, releasing stock");
            self.release(product.id, quantity, &e.to_string()).await?;
            return Err(e.into());
        }

        tracing::info!(
            sale_id = %sale.id,
            product_id = %sale.product_id,
            quantity = sale.quantity,
            total = sale.total,
            "sale recorded"
        );
        Ok(sale)
    }

    async fn release(&self, product_id: ProductId, quantity: u32, cause: &str) -> ServiceResult<()> {
        let mut last_error = String::new();
        for attempt in 1..=RELEASE_ATTEMPTS {
            match self.products.increment_stock(product_id, quantity, Utc::now()).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::warn!(%product_id, attempt, error = %e, "stock release failed");
                    last_error = e.to_string();
                }
            }
        }

        let reason = format!("sale not recorded ({cause}); stock release failed: {last_error}");
        tracing::error!(%product_id, quantity, reason = %reason, "stock and sales are out of step");
        Err(ServiceError::PartialFailure {
            product_id,
            quantity,
            reason,
        })
    }

    pub async fn get(&self, id: SaleId) -> ServiceResult<Sale> {
        self.sales
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("sale").into())
    }

    pub async fn list(&self, filter: SaleFilter, page: PageRequest) -> ServiceResult<Page<Sale>> {
        let items = self.sales.list(&filter, page).await?;
        let total = self.sales.count(&filter).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn summary(&self, period: &Period) -> ServiceResult<SalesSummary> {
        let totals = self.sales.totals(&period_filter(period)).await?;
        Ok(SalesSummary::new(totals, period))
    }

    /// Per-product totals, highest revenue first.
    pub async fn by_product(&self, period: &Period) -> ServiceResult<Vec<ProductSales>> {
        let rows = self.sales.by_product(&period_filter(period)).await?;
        let ids: Vec<ProductId> = rows.iter().map(|r| r.product_id).collect();
        let names = self.products.names(&ids).await?;
        Ok(name_rollups(rows, &names))
    }

    pub async fn export(&self, period: &Period, format: ExportFormat) -> ServiceResult<SalesExport> {
        let sales = self
            .sales
            .list(&period_filter(period), PageRequest::all())
            .await?;
        let mut ids: Vec<ProductId> = sales.iter().map(|s| s.product_id).collect();
        ids.sort();
        ids.dedup();
        let names = self.products.names(&ids).await?;

        let body = match format {
            ExportFormat::Csv => write_csv(&sales, &names),
        };
        tracing::info!(period = %period.label(), rows = sales.len(), "sales exported");

        Ok(SalesExport {
            filename: export_filename(period),
            content_type: format.content_type(),
            body,
        })
    }
}

fn period_filter(period: &Period) -> SaleFilter {
    SaleFilter {
        product_id: None,
        from: Some(period.start()),
        to: Some(period.end()),
    }
}
