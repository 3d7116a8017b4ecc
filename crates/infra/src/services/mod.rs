//! Application services: the operations the HTTP layer exposes, written
//! against the storage traits in [`crate::store`].

use std::sync::Arc;

use sqlx::PgPool;

use agristore_auth::{PasswordHasher, TokenIssuer};

use crate::store::{
    CategoryRepository, InMemoryCategoryRepository, InMemoryProductRepository,
    InMemorySaleRepository, InMemoryUserRepository, PostgresCategoryRepository,
    PostgresProductRepository, PostgresSaleRepository, PostgresUserRepository, ProductRepository,
    SaleRepository, UserRepository,
};
use crate::uploads::LocalImageStore;

pub mod auth;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod sales;

pub use auth::{AuthService, Session};
pub use catalog::{CategoryService, ProductService};
pub use error::{ServiceError, ServiceResult};
pub use inventory::InventoryService;
pub use sales::{SalesExport, SalesService};

/// One repository per entity, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub sales: Arc<dyn SaleRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            categories: Arc::new(InMemoryCategoryRepository::new()),
            products: Arc::new(InMemoryProductRepository::new()),
            sales: Arc::new(InMemorySaleRepository::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(pool.clone())),
            products: Arc::new(PostgresProductRepository::new(pool.clone())),
            sales: Arc::new(PostgresSaleRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub products: ProductService,
    pub categories: CategoryService,
    pub inventory: InventoryService,
    pub sales: SalesService,
}

impl Services {
    pub fn new(
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
        uploads: Arc<LocalImageStore>,
    ) -> Self {
        Self {
            auth: AuthService::new(repos.users, hasher, tokens),
            products: ProductService::new(repos.products.clone(), uploads),
            categories: CategoryService::new(repos.categories),
            inventory: InventoryService::new(repos.products.clone()),
            sales: SalesService::new(repos.sales, repos.products),
        }
    }
}
