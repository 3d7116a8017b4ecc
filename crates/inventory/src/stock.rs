use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use agristore_catalog::Product;
use agristore_core::ProductId;

/// Stock strictly below this is "low" unless the caller says otherwise.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Missing, zero or negative thresholds fall back to the default.
pub fn effective_threshold(requested: Option<i64>) -> u32 {
    requested
        .filter(|t| *t > 0)
        .map(|t| u32::try_from(t).unwrap_or(u32::MAX))
        .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockProduct {
    pub id: ProductId,
    pub name: String,
    pub stock: u32,
    pub category: String,
    pub price: f64,
}

impl From<&Product> for LowStockProduct {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            stock: p.stock,
            category: p.category.clone(),
            price: p.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStock {
    pub category: String,
    pub total_stock: u64,
    pub total_value: f64,
    pub product_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    pub total_products: u64,
    pub total_stock_value: f64,
    pub low_stock_products: u64,
    pub categories: Vec<CategoryStock>,
}

impl StockSummary {
    /// Roll per-category rows up into the grand totals.
    pub fn from_categories(categories: Vec<CategoryStock>, low_stock_products: u64) -> Self {
        let total_products = categories.iter().map(|c| c.product_count).sum();
        let total_stock_value = categories.iter().map(|c| c.total_value).sum();
        Self {
            total_products,
            total_stock_value,
            low_stock_products,
            categories,
        }
    }
}

/// Active products under `threshold`, lowest stock first.
pub fn low_stock<'a>(products: impl IntoIterator<Item = &'a Product>, threshold: u32) -> Vec<LowStockProduct> {
    let mut rows: Vec<LowStockProduct> = products
        .into_iter()
        .filter(|p| p.is_active && p.stock < threshold)
        .map(LowStockProduct::from)
        .collect();
    rows.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
    rows
}

/// Group active products by category (categories in name order).
pub fn summarize<'a>(products: impl IntoIterator<Item = &'a Product>, low_stock_threshold: u32) -> StockSummary {
    let mut groups: BTreeMap<&str, CategoryStock> = BTreeMap::new();
    let mut low = 0u64;

    for product in products.into_iter().filter(|p| p.is_active) {
        if product.stock < low_stock_threshold {
            low += 1;
        }
        let row = groups
            .entry(product.category.as_str())
            .or_insert_with(|| CategoryStock {
                category: product.category.clone(),
                total_stock: 0,
                total_value: 0.0,
                product_count: 0,
            });
        row.total_stock += u64::from(product.stock);
        row.total_value += product.stock_value();
        row.product_count += 1;
    }

    StockSummary::from_categories(groups.into_values().collect(), low)
}
