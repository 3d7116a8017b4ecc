//! Product list filtering.
//!
//! [`ProductFilter::matches`] is the single definition of the filter so that
//! list and count queries over in-memory data can never disagree.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::Product;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub brand: Option<String>,
    /// Inclusive lower bound; ignored unless positive.
    pub min_price: Option<f64>,
    /// Inclusive upper bound; ignored unless positive.
    pub max_price: Option<f64>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}

impl ProductFilter {
    /// Drop blank text criteria and non-positive price bounds.
    pub fn normalized(mut self) -> Self {
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&self.category) {
            self.category = None;
        }
        if blank(&self.brand) {
            self.brand = None;
        }
        if blank(&self.search) {
            self.search = None;
        }
        self.min_price = self.min_price.filter(|p| *p > 0.0);
        self.max_price = self.max_price.filter(|p| *p > 0.0);
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if &product.brand != brand {
                return false;
            }
        }
        if let Some(min) = self.min_price.filter(|p| *p > 0.0) {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price.filter(|p| *p > 0.0) {
            if product.price > max {
                return false;
            }
        }
        if let Some(active) = self.is_active {
            if product.is_active != active {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if !product.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// List order: newest first, id as tie-breaker.
pub fn newest_first(a: &Product, b: &Product) -> Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}
