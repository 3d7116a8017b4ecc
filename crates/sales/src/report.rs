//! Aggregate sales reports.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use agristore_core::ProductId;

use crate::{Period, Sale};

/// Name shown for sales whose product no longer exists.
pub const UNKNOWN_PRODUCT: &str = "Unknown";

/// Raw sums over a set of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SaleTotals {
    pub revenue: f64,
    pub items: u64,
}

impl SaleTotals {
    pub fn of<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Self {
        sales.into_iter().fold(Self::default(), |acc, s| Self {
            revenue: acc.revenue + s.total,
            items: acc.items + u64::from(s.quantity),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_sales: f64,
    /// Same figure as `total_sales`; both are part of the public response.
    pub total_revenue: f64,
    pub total_items: u64,
    pub period: String,
}

impl SalesSummary {
    pub fn new(totals: SaleTotals, period: &Period) -> Self {
        Self {
            total_sales: totals.revenue,
            total_revenue: totals.revenue,
            total_items: totals.items,
            period: period.label(),
        }
    }
}

/// Per-product sums before names are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRollup {
    pub product_id: ProductId,
    pub total_sold: u64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub product_name: String,
    pub total_sold: u64,
    pub total_revenue: f64,
}

/// Group by product, highest revenue first.
pub fn rollup_by_product<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Vec<ProductRollup> {
    let mut by_product: HashMap<ProductId, ProductRollup> = HashMap::new();
    for sale in sales {
        let row = by_product.entry(sale.product_id).or_insert_with(|| ProductRollup {
            product_id: sale.product_id,
            total_sold: 0,
            total_revenue: 0.0,
        });
        row.total_sold += u64::from(sale.quantity);
        row.total_revenue += sale.total;
    }

    let mut rows: Vec<ProductRollup> = by_product.into_values().collect();
    sort_by_revenue(&mut rows);
    rows
}

pub fn sort_by_revenue(rows: &mut [ProductRollup]) {
    rows.sort_by(|a, b| {
        b.total_revenue
            .total_cmp(&a.total_revenue)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
}

/// Attach current product names. Deleted products keep their row as `Unknown`.
pub fn name_rollups(rows: Vec<ProductRollup>, names: &HashMap<ProductId, String>) -> Vec<ProductSales> {
    rows.into_iter()
        .map(|r| ProductSales {
            product_name: names
                .get(&r.product_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
            product_id: r.product_id,
            total_sold: r.total_sold,
            total_revenue: r.total_revenue,
        })
        .collect()
}
