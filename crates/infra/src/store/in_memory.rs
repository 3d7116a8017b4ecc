//! In-memory repositories for tests and local development.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use agristore_auth::User;
use agristore_catalog::filter::newest_first as product_order;
use agristore_catalog::{Category, Product, ProductFilter};
use agristore_core::{CategoryId, Entity, PageRequest, ProductId, SaleId, UserId};
use agristore_inventory::{LowStockProduct, StockSummary, low_stock, summarize};
use agristore_sales::sale::newest_first as sale_order;
use agristore_sales::{ProductRollup, Sale, SaleFilter, SaleTotals, rollup_by_product};

use super::{
    CategoryRepository, ProductRepository, SaleRepository, StockDecrement, StoreError, StoreResult,
    UserRepository,
};

/// Id-keyed rows behind a lock.
#[derive(Debug)]
struct Table<T: Entity> {
    rows: RwLock<HashMap<T::Id, T>>,
}

impl<T: Entity + Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<T::Id, T>>> {
        self.rows.read().map_err(|_| StoreError::backend("in-memory table lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<T::Id, T>>> {
        self.rows.write().map_err(|_| StoreError::backend("in-memory table lock poisoned"))
    }

    fn get(&self, id: T::Id) -> StoreResult<Option<T>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> StoreResult<Option<T>> {
        Ok(self.read()?.values().find(|row| pred(row)).cloned())
    }

    fn filtered(&self, pred: impl Fn(&T) -> bool) -> StoreResult<Vec<T>> {
        Ok(self.read()?.values().filter(|row| pred(row)).cloned().collect())
    }

    /// Insert unless a row with the same unique key exists.
    fn insert_unique<K: PartialEq>(
        &self,
        row: &T,
        entity: &'static str,
        key: impl Fn(&T) -> K,
        display: impl Fn(&T) -> String,
    ) -> StoreResult<()> {
        let mut rows = self.write()?;
        let wanted = key(row);
        if rows.contains_key(&row.id()) || rows.values().any(|r| key(r) == wanted) {
            return Err(StoreError::Duplicate {
                entity,
                key: display(row),
            });
        }
        rows.insert(row.id(), row.clone());
        Ok(())
    }

    fn remove(&self, id: T::Id) -> StoreResult<bool> {
        Ok(self.write()?.remove(&id).is_some())
    }

    /// Run `f` on a row under the write lock.
    fn modify<R>(&self, id: T::Id, f: impl FnOnce(&mut T) -> R) -> StoreResult<Option<R>> {
        Ok(self.write()?.get_mut(&id).map(f))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct InMemoryUserRepository {
    users: Table<User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self { users: Table::new() }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        self.users
            .insert_unique(user, "user email", |u| u.email.clone(), |u| u.email.clone())
    }

    async fn get(&self, id: UserId) -> StoreResult<Option<User>> {
        self.users.get(id)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.users.find(|u| u.email == email)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct InMemoryCategoryRepository {
    categories: Table<Category>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self { categories: Table::new() }
    }
}

impl Default for InMemoryCategoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn insert(&self, category: &Category) -> StoreResult<()> {
        self.categories
            .insert_unique(category, "category name", |c| c.name.clone(), |c| c.name.clone())
    }

    async fn get(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        self.categories.get(id)
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        self.categories.find(|c| c.name == name)
    }

    async fn list(&self) -> StoreResult<Vec<Category>> {
        let mut all = self.categories.filtered(|_| true)?;
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn delete(&self, id: CategoryId) -> StoreResult<bool> {
        self.categories.remove(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct InMemoryProductRepository {
    products: Table<Product>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self { products: Table::new() }
    }
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, product: &Product) -> StoreResult<()> {
        self.products
            .insert_unique(product, "product id", |p| p.id, |p| p.id.to_string())
    }

    async fn get(&self, id: ProductId) -> StoreResult<Option<Product>> {
        self.products.get(id)
    }

    async fn names(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, String>> {
        let rows = self.products.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id).map(|p| (*id, p.name.clone())))
            .collect())
    }

    async fn update(&self, product: &Product) -> StoreResult<bool> {
        let updated = self.products.modify(product.id, |stored| {
            let stock = stored.stock;
            *stored = product.clone();
            stored.stock = stock;
        })?;
        Ok(updated.is_some())
    }

    async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        self.products.remove(id)
    }

    async fn list(&self, filter: &ProductFilter, page: PageRequest) -> StoreResult<Vec<Product>> {
        let mut matching = self.products.filtered(|p| filter.matches(p))?;
        matching.sort_by(product_order);
        Ok(page.slice(matching))
    }

    async fn count(&self, filter: &ProductFilter) -> StoreResult<u64> {
        let rows = self.products.read()?;
        Ok(rows.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn set_stock(&self, id: ProductId, stock: u32, now: DateTime<Utc>) -> StoreResult<bool> {
        let updated = self.products.modify(id, |p| {
            p.stock = stock;
            p.updated_at = now;
        })?;
        Ok(updated.is_some())
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<StockDecrement> {
        let outcome = self.products.modify(id, |p| {
            if p.stock < quantity {
                return StockDecrement::Insufficient { available: p.stock };
            }
            p.stock -= quantity;
            p.updated_at = now;
            StockDecrement::Applied { remaining: p.stock }
        })?;
        Ok(outcome.unwrap_or(StockDecrement::Missing))
    }

    async fn increment_stock(&self, id: ProductId, quantity: u32, now: DateTime<Utc>) -> StoreResult<bool> {
        let updated = self.products.modify(id, |p| {
            p.stock = p.stock.saturating_add(quantity);
            p.updated_at = now;
        })?;
        Ok(updated.is_some())
    }

    async fn low_stock(&self, threshold: u32) -> StoreResult<Vec<LowStockProduct>> {
        let rows = self.products.read()?;
        Ok(low_stock(rows.values(), threshold))
    }

    async fn stock_summary(&self, low_stock_threshold: u32) -> StoreResult<StockSummary> {
        let rows = self.products.read()?;
        Ok(summarize(rows.values(), low_stock_threshold))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sales
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct InMemorySaleRepository {
    sales: Table<Sale>,
}

impl InMemorySaleRepository {
    pub fn new() -> Self {
        Self { sales: Table::new() }
    }
}

impl Default for InMemorySaleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SaleRepository for InMemorySaleRepository {
    async fn insert(&self, sale: &Sale) -> StoreResult<()> {
        self.sales.insert_unique(sale, "sale id", |s| s.id, |s| s.id.to_string())
    }

    async fn get(&self, id: SaleId) -> StoreResult<Option<Sale>> {
        self.sales.get(id)
    }

    async fn list(&self, filter: &SaleFilter, page: PageRequest) -> StoreResult<Vec<Sale>> {
        let mut matching = self.sales.filtered(|s| filter.matches(s))?;
        matching.sort_by(sale_order);
        Ok(page.slice(matching))
    }

    async fn count(&self, filter: &SaleFilter) -> StoreResult<u64> {
        let rows = self.sales.read()?;
        Ok(rows.values().filter(|s| filter.matches(s)).count() as u64)
    }

    async fn totals(&self, filter: &SaleFilter) -> StoreResult<SaleTotals> {
        let rows = self.sales.read()?;
        Ok(SaleTotals::of(rows.values().filter(|s| filter.matches(s))))
    }

    async fn by_product(&self, filter: &SaleFilter) -> StoreResult<Vec<ProductRollup>> {
        let rows = self.sales.read()?;
        Ok(rollup_by_product(rows.values().filter(|s| filter.matches(s))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agristore_catalog::NewProduct;
    use chrono::Duration;
    use proptest::prelude::*;

    fn product(name: &str, category: &str, price: f64, stock: u32, active: bool) -> Product {
        Product::create(
            NewProduct {
                name: name.into(),
                price,
                category: category.into(),
                brand: "Acme".into(),
                stock: i64::from(stock),
                is_active: Some(active),
                ..NewProduct::default()
            },
            vec![],
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn conditional_decrement_never_goes_negative() {
        let repo = InMemoryProductRepository::new();
        let p = product("Pump", "Irrigation", 10.0, 5, true);
        repo.insert(&p).await.unwrap();

        assert_eq!(
            repo.decrement_stock(p.id, 6, Utc::now()).await.unwrap(),
            StockDecrement::Insufficient { available: 5 }
        );
        assert_eq!(
            repo.decrement_stock(p.id, 5, Utc::now()).await.unwrap(),
            StockDecrement::Applied { remaining: 0 }
        );
        assert_eq!(
            repo.decrement_stock(ProductId::new(), 1, Utc::now()).await.unwrap(),
            StockDecrement::Missing
        );
    }

    #[tokio::test]
    async fn update_preserves_stored_stock() {
        let repo = InMemoryProductRepository::new();
        let mut p = product("Pump", "Irrigation", 10.0, 5, true);
        repo.insert(&p).await.unwrap();
        repo.decrement_stock(p.id, 2, Utc::now()).await.unwrap();

        p.name = "Pump XL".into();
        assert!(repo.update(&p).await.unwrap());

        let stored = repo.get(p.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Pump XL");
        assert_eq!(stored.stock, 3);
    }

    #[tokio::test]
    async fn unique_names_are_enforced() {
        let repo = InMemoryCategoryRepository::new();
        let now = Utc::now();
        let first = agristore_catalog::NewCategory { name: "Tools".into() }.into_category(now).unwrap();
        let second = agristore_catalog::NewCategory { name: "Tools".into() }.into_category(now).unwrap();

        repo.insert(&first).await.unwrap();
        assert!(matches!(
            repo.insert(&second).await,
            Err(StoreError::Duplicate { .. })
        ));
    }

    #[tokio::test]
    async fn sales_filter_by_product_and_date() {
        let repo = InMemorySaleRepository::new();
        let (a, b) = (ProductId::new(), ProductId::new());
        let now = Utc::now();
        for (pid, at) in [(a, now), (a, now - Duration::days(40)), (b, now)] {
            repo.insert(&Sale::record(pid, 1, 2.0, at)).await.unwrap();
        }

        let filter = SaleFilter {
            product_id: Some(a),
            from: Some(now - Duration::days(1)),
            to: None,
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
        assert_eq!(repo.totals(&SaleFilter::default()).await.unwrap().items, 3);
        let all = repo.list(&SaleFilter::default(), PageRequest::all()).await.unwrap();
        assert!(all.windows(2).all(|w| w[0].date_sold >= w[1].date_sold));
    }

    fn arb_products() -> impl Strategy<Value = Vec<Product>> {
        proptest::collection::vec(
            (
                prop_oneof![Just("Hose"), Just("Pump"), Just("Sprayer")],
                prop_oneof![Just("Irrigation"), Just("Tools")],
                1u32..300,
                0u32..30,
                any::<bool>(),
            )
                .prop_map(|(n, c, price, stock, active)| product(n, c, f64::from(price), stock, active)),
            0..30,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Count(filter) == len(List(filter, page=1, limit=all)).
        #[test]
        fn count_matches_unbounded_list(
            products in arb_products(),
            category in proptest::option::of(prop_oneof![Just("Irrigation".to_string()), Just("Tools".to_string())]),
            min_price in proptest::option::of(0u32..300),
            is_active in proptest::option::of(any::<bool>()),
            search in proptest::option::of(prop_oneof![Just("p".to_string()), Just("HOSE".to_string())]),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let repo = InMemoryProductRepository::new();
                for p in &products {
                    repo.insert(p).await.unwrap();
                }
                let filter = ProductFilter {
                    category,
                    min_price: min_price.map(f64::from),
                    is_active,
                    search,
                    ..ProductFilter::default()
                }
                .normalized();

                let count = repo.count(&filter).await.unwrap();
                let listed = repo.list(&filter, PageRequest::all()).await.unwrap();
                assert_eq!(count, listed.len() as u64);
            });
        }

        /// Any interleaving of stock writes and sales keeps stock non-negative
        /// and accounts for every applied decrement.
        #[test]
        fn stock_stays_consistent(ops in proptest::collection::vec((any::<bool>(), 0u32..20), 0..50)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let repo = InMemoryProductRepository::new();
                let p = product("Pump", "Irrigation", 10.0, 10, true);
                repo.insert(&p).await.unwrap();
                let mut expected = 10u32;

                for (is_set, n) in ops {
                    if is_set {
                        repo.set_stock(p.id, n, Utc::now()).await.unwrap();
                        expected = n;
                    } else {
                        match repo.decrement_stock(p.id, n, Utc::now()).await.unwrap() {
                            StockDecrement::Applied { remaining } => {
                                expected -= n;
                                assert_eq!(remaining, expected);
                            }
                            StockDecrement::Insufficient { available } => {
                                assert!(n > available);
                                assert_eq!(available, expected);
                            }
                            StockDecrement::Missing => unreachable!(),
                        }
                    }
                }
                assert_eq!(repo.get(p.id).await.unwrap().unwrap().stock, expected);
            });
        }
    }
}
