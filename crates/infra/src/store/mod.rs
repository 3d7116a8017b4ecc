//! Storage capabilities, one trait per entity.
//!
//! Services depend on these traits only; `in_memory` backs tests and local
//! runs, `postgres` backs deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use agristore_auth::User;
use agristore_catalog::{Category, Product, ProductFilter};
use agristore_core::{CategoryId, PageRequest, ProductId, SaleId, UserId};
use agristore_inventory::{LowStockProduct, StockSummary};
use agristore_sales::{ProductRollup, Sale, SaleFilter, SaleTotals};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{
    InMemoryCategoryRepository, InMemoryProductRepository, InMemorySaleRepository,
    InMemoryUserRepository,
};
pub use postgres::{
    PostgresCategoryRepository, PostgresProductRepository, PostgresSaleRepository,
    PostgresUserRepository, apply_schema,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique key is already taken.
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// Anything else the backend reports.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    Applied { remaining: u32 },
    Insufficient { available: u32 },
    Missing,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Emails are unique.
    async fn insert(&self, user: &User) -> StoreResult<()>;

    async fn get(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Look up by normalized email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert a new category. Names are unique.
    async fn insert(&self, category: &Category) -> StoreResult<()>;

    async fn get(&self, id: CategoryId) -> StoreResult<Option<Category>>;

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>>;

    /// All categories ordered by name.
    async fn list(&self) -> StoreResult<Vec<Category>>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: CategoryId) -> StoreResult<bool>;
}

/// Product storage.
///
/// `stock` is owned by the stock methods: `update` persists every other
/// field and leaves the stored stock untouched, so a concurrent sale can
/// never be overwritten by a stale product snapshot.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, product: &Product) -> StoreResult<()>;

    async fn get(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Current names for the given ids; unknown ids are simply absent.
    async fn names(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, String>>;

    /// Returns `false` when the product does not exist.
    async fn update(&self, product: &Product) -> StoreResult<bool>;

    /// Returns `false` when the product does not exist.
    async fn delete(&self, id: ProductId) -> StoreResult<bool>;

    /// Newest first.
    async fn list(&self, filter: &ProductFilter, page: PageRequest) -> StoreResult<Vec<Product>>;

    /// Uses exactly the filter `list` applies.
    async fn count(&self, filter: &ProductFilter) -> StoreResult<u64>;

    /// Overwrite stock. Returns `false` when the product does not exist.
    async fn set_stock(&self, id: ProductId, stock: u32, now: DateTime<Utc>) -> StoreResult<bool>;

    /// Atomically `stock -= quantity` only if `stock >= quantity`.
    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<StockDecrement>;

    /// Return units to stock. Returns `false` when the product does not exist.
    async fn increment_stock(&self, id: ProductId, quantity: u32, now: DateTime<Utc>) -> StoreResult<bool>;

    /// Active products with `stock < threshold`, lowest first.
    async fn low_stock(&self, threshold: u32) -> StoreResult<Vec<LowStockProduct>>;

    /// Per-category totals over active products.
    async fn stock_summary(&self, low_stock_threshold: u32) -> StoreResult<StockSummary>;
}

#[async_trait]
pub trait SaleRepository: Send + Sync {
    async fn insert(&self, sale: &Sale) -> StoreResult<()>;

    async fn get(&self, id: SaleId) -> StoreResult<Option<Sale>>;

    /// Most recent first.
    async fn list(&self, filter: &SaleFilter, page: PageRequest) -> StoreResult<Vec<Sale>>;

    async fn count(&self, filter: &SaleFilter) -> StoreResult<u64>;

    async fn totals(&self, filter: &SaleFilter) -> StoreResult<SaleTotals>;

    /// Highest revenue first.
    async fn by_product(&self, filter: &SaleFilter) -> StoreResult<Vec<ProductRollup>>;
}
