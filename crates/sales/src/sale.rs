use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use agristore_core::{DomainError, DomainResult, Entity, ProductId, SaleId};

use crate::period::{end_of_day, start_of_day};

/// A recorded sale. Immutable once written.
///
/// The unit price is a snapshot so later catalog price changes do not
/// rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: f64,
    pub total: f64,
    pub date_sold: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> SaleId {
        self.id
    }
}

impl Sale {
    pub fn record(product_id: ProductId, quantity: u32, unit_price: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: SaleId::new(),
            product_id,
            quantity,
            price: unit_price,
            total: unit_price * f64::from(quantity),
            date_sold: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sale request. `price` is informational: when present it must match the
/// catalog price.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSale {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub price: Option<f64>,
}

impl NewSale {
    /// Validate request shape; returns the quantity.
    pub fn validate(&self) -> DomainResult<u32> {
        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| DomainError::validation("quantity must be greater than 0"))?;
        if let Some(price) = self.price {
            if !(price.is_finite() && price > 0.0) {
                return Err(DomainError::validation("price must be greater than 0"));
            }
        }
        Ok(quantity)
    }
}

/// The unit price a sale is recorded at: always the catalog price.
pub fn resolve_price(requested: Option<f64>, catalog_price: f64) -> DomainResult<f64> {
    match requested {
        Some(price) if to_cents(price) != to_cents(catalog_price) => Err(DomainError::validation(format!(
            "price {price:.2} does not match catalog price {catalog_price:.2}"
        ))),
        _ => Ok(catalog_price),
    }
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaleFilter {
    pub product_id: Option<ProductId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SaleFilter {
    /// Build from calendar dates; `to` covers the whole day.
    pub fn from_dates(product_id: Option<ProductId>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            product_id,
            from: from.map(start_of_day),
            to: to.map(end_of_day),
        }
    }

    pub fn matches(&self, sale: &Sale) -> bool {
        self.product_id.is_none_or(|id| sale.product_id == id)
            && self.from.is_none_or(|from| sale.date_sold >= from)
            && self.to.is_none_or(|to| sale.date_sold <= to)
    }
}

/// List order: most recent sale first.
pub fn newest_first(a: &Sale, b: &Sale) -> Ordering {
    b.date_sold.cmp(&a.date_sold).then_with(|| b.id.cmp(&a.id))
}
