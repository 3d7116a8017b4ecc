use std::sync::Arc;

use chrono::Utc;

use agristore_catalog::product::validate_stock;
use agristore_catalog::Product;
use agristore_core::{DomainError, ProductId};
use agristore_inventory::{
    DEFAULT_LOW_STOCK_THRESHOLD, LowStockProduct, StockSummary, effective_threshold,
};

use super::ServiceResult;
use crate::store::ProductRepository;

#[derive(Clone)]
pub struct InventoryService {
    products: Arc<dyn ProductRepository>,
}

impl InventoryService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    /// Overwrite a product's stock level.
    pub async fn update_stock(&self, id: ProductId, stock: i64) -> ServiceResult<Product> {
        let stock = validate_stock(stock)?;
        if !self.products.set_stock(id, stock, Utc::now()).await? {
            return Err(DomainError::not_found("product").into());
        }
        tracing::info!(product_id = %id, stock, "stock updated");

        self.products
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product").into())
    }

    /// Active products below `threshold`; missing or non-positive values use the default.
    pub async fn low_stock(&self, threshold: Option<i64>) -> ServiceResult<Vec<LowStockProduct>> {
        Ok(self.products.low_stock(effective_threshold(threshold)).await?)
    }

    pub async fn summary(&self) -> ServiceResult<StockSummary> {
        Ok(self.products.stock_summary(DEFAULT_LOW_STOCK_THRESHOLD).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agristore_catalog::NewProduct;

    use crate::services::ServiceError;
    use crate::store::InMemoryProductRepository;

    async fn seeded(stocks: &[(&str, &str, i64, f64)]) -> (InventoryService, Vec<Product>) {
        let repo = Arc::new(InMemoryProductRepository::new());
        let mut products = Vec::new();
        for (name, category, stock, price) in stocks {
            let input = NewProduct {
                name: (*name).into(),
                category: (*category).into(),
                stock: *stock,
                price: *price,
                ..NewProduct::default()
            };
            let product = Product::create(input, Vec::new(), Utc::now()).unwrap();
            repo.insert(&product).await.unwrap();
            products.push(product);
        }
        (InventoryService::new(repo), products)
    }

    #[tokio::test]
    async fn update_stock_overwrites_and_rejects_negative() {
        let (svc, products) = seeded(&[("Hoe", "Tools", 4, 12.5)]).await;
        let id = products[0].id;

        assert_eq!(svc.update_stock(id, 40).await.unwrap().stock, 40);

        let err = svc.update_stock(id, -1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));

        let err = svc.update_stock(ProductId::new(), 5).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn low_stock_uses_default_threshold_and_sorts_ascending() {
        let (svc, _) = seeded(&[("A", "Tools", 9, 1.0), ("B", "Tools", 10, 1.0), ("C", "Seeds", 2, 1.0)]).await;

        let low = svc.low_stock(None).await.unwrap();
        let names: Vec<_> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["C", "A"]);

        assert_eq!(svc.low_stock(Some(0)).await.unwrap().len(), 2);
        assert_eq!(svc.low_stock(Some(11)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn summary_groups_by_category() {
        let (svc, _) = seeded(&[("A", "Tools", 2, 10.0), ("B", "Tools", 20, 1.0), ("C", "Seeds", 5, 2.0)]).await;

        let summary = svc.summary().await.unwrap();

        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.total_stock_value, 50.0);
        assert_eq!(summary.low_stock_products, 2);
        let tools = summary.categories.iter().find(|c| c.category == "Tools").unwrap();
        assert_eq!(tools.total_stock, 22);
        assert_eq!(tools.total_value, 40.0);
        assert_eq!(tools.product_count, 2);
    }
}
