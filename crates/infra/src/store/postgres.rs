//! Postgres-backed repositories.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | any | `Backend` |
//! | Pool closed, IO, decode | n/a | `Backend` |
//!
//! Product images live in a `JSONB` column; everything else is a plain column.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

use agristore_auth::{Role, User};
use agristore_catalog::{Category, Product, ProductFilter, ProductImage};
use agristore_core::{CategoryId, PageRequest, ProductId, SaleId, UserId};
use agristore_inventory::{CategoryStock, LowStockProduct, StockSummary};
use agristore_sales::{ProductRollup, Sale, SaleFilter, SaleTotals};

use super::{
    CategoryRepository, ProductRepository, SaleRepository, StockDecrement, StoreError, StoreResult,
    UserRepository,
};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Create tables and indexes if they do not exist yet.
pub async fn apply_schema(pool: &PgPool) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("apply_schema", "schema", e))
}

fn map_sqlx_error(operation: &str, entity: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().is_some_and(|c| c.as_ref() == "23505") {
                StoreError::Duplicate {
                    entity,
                    key: db_err.constraint().unwrap_or("unique key").to_string(),
                }
            } else {
                StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        other => StoreError::Backend(format!("sqlx error in {}: {}", operation, other)),
    }
}

fn decode_err(column: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("failed to decode {column}: {err}"))
}

fn to_u32(column: &str, value: i64) -> StoreResult<u32> {
    u32::try_from(value).map_err(|e| decode_err(column, e))
}

fn to_u64(column: &str, value: i64) -> StoreResult<u64> {
    u64::try_from(value).map_err(|e| decode_err(column, e))
}

fn page_bounds(page: PageRequest) -> (i64, i64) {
    let limit = i64::from(page.limit());
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        role: role.parse::<Role>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("insert_user", "user email", e))
    }

    async fn get(&self, id: UserId) -> StoreResult<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(user_from_row).transpose())
            .map_err(|e| map_sqlx_error("get_user", "user", e))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(user_from_row).transpose())
            .map_err(|e| map_sqlx_error("find_user_by_email", "user", e))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn category_from_row(row: &PgRow) -> Result<Category, sqlx::Error> {
    Ok(Category {
        id: CategoryId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn insert(&self, category: &Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(category.created_at)
            .bind(category.updated_at)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error("insert_category", "category name", e))
    }

    async fn get(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        sqlx::query("SELECT * FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(category_from_row).transpose())
            .map_err(|e| map_sqlx_error("get_category", "category", e))
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        sqlx::query("SELECT * FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(category_from_row).transpose())
            .map_err(|e| map_sqlx_error("find_category_by_name", "category", e))
    }

    async fn list(&self) -> StoreResult<Vec<Category>> {
        sqlx::query("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .and_then(|rows| rows.iter().map(category_from_row).collect())
            .map_err(|e| map_sqlx_error("list_categories", "category", e))
    }

    async fn delete(&self, id: CategoryId) -> StoreResult<bool> {
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected() > 0)
            .map_err(|e| map_sqlx_error("delete_category", "category", e))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Shared by list and count so both always see the same rows.
const PRODUCT_FILTER: &str = r#"
    ($1::text IS NULL OR category = $1)
    AND ($2::text IS NULL OR brand = $2)
    AND ($3::float8 IS NULL OR price >= $3)
    AND ($4::float8 IS NULL OR price <= $4)
    AND ($5::bool IS NULL OR is_active = $5)
    AND ($6::text IS NULL OR name ILIKE '%' || $6 || '%' ESCAPE '\')
"#;

fn bind_product_filter<'q>(
    query: Query<'q, Postgres, PgArguments>,
    filter: &ProductFilter,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(filter.category.clone())
        .bind(filter.brand.clone())
        .bind(filter.min_price.filter(|p| *p > 0.0))
        .bind(filter.max_price.filter(|p| *p > 0.0))
        .bind(filter.is_active)
        .bind(filter.search.as_deref().map(|s| escape_like(s.trim())))
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    let stock: i64 = row.try_get("stock")?;
    let images: Json<Vec<ProductImage>> = row.try_get("images")?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        category: row.try_get("category")?,
        brand: row.try_get("brand")?,
        image_url: row.try_get("image_url")?,
        images: images.0,
        stock: u32::try_from(stock).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn insert(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price, category, brand, image_url, images,
                stock, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.image_url)
        .bind(Json(&product.images))
        .bind(i64::from(product.stock))
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("insert_product", "product id", e))
    }

    async fn get(&self, id: ProductId) -> StoreResult<Option<Product>> {
        sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(product_from_row).transpose())
            .map_err(|e| map_sqlx_error("get_product", "product", e))
    }

    async fn names(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, String>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query("SELECT id, name FROM products WHERE id = ANY($1)")
            .bind(uuids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product_names", "product", e))?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(|e| decode_err("id", e))?;
                let name: String = row.try_get("name").map_err(|e| decode_err("name", e))?;
                Ok((ProductId::from_uuid(id), name))
            })
            .collect()
    }

    async fn update(&self, product: &Product) -> StoreResult<bool> {
        sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, category = $5, brand = $6,
                image_url = $7, images = $8, is_active = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.image_url)
        .bind(Json(&product.images))
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected() > 0)
        .map_err(|e| map_sqlx_error("update_product", "product", e))
    }

    async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected() > 0)
            .map_err(|e| map_sqlx_error("delete_product", "product", e))
    }

    async fn list(&self, filter: &ProductFilter, page: PageRequest) -> StoreResult<Vec<Product>> {
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT * FROM products WHERE {PRODUCT_FILTER} ORDER BY created_at DESC, id DESC LIMIT $7 OFFSET $8"
        );
        bind_product_filter(sqlx::query(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .and_then(|rows| rows.iter().map(product_from_row).collect())
            .map_err(|e| map_sqlx_error("list_products", "product", e))
    }

    async fn count(&self, filter: &ProductFilter) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) AS n FROM products WHERE {PRODUCT_FILTER}");
        let row = bind_product_filter(sqlx::query(&sql), filter)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", "product", e))?;
        let n: i64 = row.try_get("n").map_err(|e| decode_err("n", e))?;
        to_u64("n", n)
    }

    async fn set_stock(&self, id: ProductId, stock: u32, now: DateTime<Utc>) -> StoreResult<bool> {
        sqlx::query("UPDATE products SET stock = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(i64::from(stock))
            .bind(now)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected() > 0)
            .map_err(|e| map_sqlx_error("set_stock", "product", e))
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<StockDecrement> {
        let applied = sqlx::query(
            r#"
            UPDATE products SET stock = stock - $2, updated_at = $3
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock", "product", e))?;

        if let Some(row) = applied {
            let remaining: i64 = row.try_get("stock").map_err(|e| decode_err("stock", e))?;
            return Ok(StockDecrement::Applied {
                remaining: to_u32("stock", remaining)?,
            });
        }

        let current = sqlx::query("SELECT stock FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("decrement_stock", "product", e))?;

        match current {
            Some(row) => {
                let available: i64 = row.try_get("stock").map_err(|e| decode_err("stock", e))?;
                Ok(StockDecrement::Insufficient {
                    available: to_u32("stock", available)?,
                })
            }
            None => Ok(StockDecrement::Missing),
        }
    }

    async fn increment_stock(&self, id: ProductId, quantity: u32, now: DateTime<Utc>) -> StoreResult<bool> {
        sqlx::query("UPDATE products SET stock = stock + $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(i64::from(quantity))
            .bind(now)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected() > 0)
            .map_err(|e| map_sqlx_error("increment_stock", "product", e))
    }

    async fn low_stock(&self, threshold: u32) -> StoreResult<Vec<LowStockProduct>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, stock, category, price FROM products
            WHERE is_active AND stock < $1
            ORDER BY stock ASC, name ASC
            "#,
        )
        .bind(i64::from(threshold))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("low_stock", "product", e))?;

        rows.iter()
            .map(|row| {
                let stock: i64 = row.try_get("stock").map_err(|e| decode_err("stock", e))?;
                Ok(LowStockProduct {
                    id: ProductId::from_uuid(row.try_get("id").map_err(|e| decode_err("id", e))?),
                    name: row.try_get("name").map_err(|e| decode_err("name", e))?,
                    stock: to_u32("stock", stock)?,
                    category: row.try_get("category").map_err(|e| decode_err("category", e))?,
                    price: row.try_get("price").map_err(|e| decode_err("price", e))?,
                })
            })
            .collect()
    }

    async fn stock_summary(&self, low_stock_threshold: u32) -> StoreResult<StockSummary> {
        let rows = sqlx::query(
            r#"
            SELECT category,
                   COALESCE(SUM(stock), 0)::BIGINT AS total_stock,
                   COALESCE(SUM(stock * price), 0)::FLOAT8 AS total_value,
                   COUNT(*)::BIGINT AS product_count
            FROM products
            WHERE is_active
            GROUP BY category
            ORDER BY category ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_summary", "product", e))?;

        let categories = rows
            .iter()
            .map(|row| {
                let total_stock: i64 = row.try_get("total_stock").map_err(|e| decode_err("total_stock", e))?;
                let product_count: i64 =
                    row.try_get("product_count").map_err(|e| decode_err("product_count", e))?;
                Ok(CategoryStock {
                    category: row.try_get("category").map_err(|e| decode_err("category", e))?,
                    total_stock: to_u64("total_stock", total_stock)?,
                    total_value: row.try_get("total_value").map_err(|e| decode_err("total_value", e))?,
                    product_count: to_u64("product_count", product_count)?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let low = sqlx::query("SELECT COUNT(*) AS n FROM products WHERE is_active AND stock < $1")
            .bind(i64::from(low_stock_threshold))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("stock_summary", "product", e))?;
        let low: i64 = low.try_get("n").map_err(|e| decode_err("n", e))?;

        Ok(StockSummary::from_categories(categories, to_u64("n", low)?))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sales
// ─────────────────────────────────────────────────────────────────────────────

pub struct PostgresSaleRepository {
    pool: PgPool,
}

impl PostgresSaleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SALE_FILTER: &str = r#"
    ($1::uuid IS NULL OR product_id = $1)
    AND ($2::timestamptz IS NULL OR date_sold >= $2)
    AND ($3::timestamptz IS NULL OR date_sold <= $3)
"#;

fn bind_sale_filter<'q>(
    query: Query<'q, Postgres, PgArguments>,
    filter: &SaleFilter,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(filter.product_id.map(Uuid::from))
        .bind(filter.from)
        .bind(filter.to)
}

fn sale_from_row(row: &PgRow) -> Result<Sale, sqlx::Error> {
    let quantity: i64 = row.try_get("quantity")?;
    Ok(Sale {
        id: SaleId::from_uuid(row.try_get("id")?),
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        quantity: u32::try_from(quantity).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        price: row.try_get("price")?,
        total: row.try_get("total")?,
        date_sold: row.try_get("date_sold")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl SaleRepository for PostgresSaleRepository {
    async fn insert(&self, sale: &Sale) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (id, product_id, quantity, price, total, date_sold, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(sale.id.as_uuid())
        .bind(sale.product_id.as_uuid())
        .bind(i64::from(sale.quantity))
        .bind(sale.price)
        .bind(sale.total)
        .bind(sale.date_sold)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("insert_sale", "sale id", e))
    }

    async fn get(&self, id: SaleId) -> StoreResult<Option<Sale>> {
        sqlx::query("SELECT * FROM sales WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(sale_from_row).transpose())
            .map_err(|e| map_sqlx_error("get_sale", "sale", e))
    }

    async fn list(&self, filter: &SaleFilter, page: PageRequest) -> StoreResult<Vec<Sale>> {
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            "SELECT * FROM sales WHERE {SALE_FILTER} ORDER BY date_sold DESC, id DESC LIMIT $4 OFFSET $5"
        );
        bind_sale_filter(sqlx::query(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .and_then(|rows| rows.iter().map(sale_from_row).collect())
            .map_err(|e| map_sqlx_error("list_sales", "sale", e))
    }

    async fn count(&self, filter: &SaleFilter) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) AS n FROM sales WHERE {SALE_FILTER}");
        let row = bind_sale_filter(sqlx::query(&sql), filter)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_sales", "sale", e))?;
        let n: i64 = row.try_get("n").map_err(|e| decode_err("n", e))?;
        to_u64("n", n)
    }

    async fn totals(&self, filter: &SaleFilter) -> StoreResult<SaleTotals> {
        let sql = format!(
            "SELECT COALESCE(SUM(total), 0)::FLOAT8 AS revenue, COALESCE(SUM(quantity), 0)::BIGINT AS items \
             FROM sales WHERE {SALE_FILTER}"
        );
        let row = bind_sale_filter(sqlx::query(&sql), filter)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("sale_totals", "sale", e))?;
        let items: i64 = row.try_get("items").map_err(|e| decode_err("items", e))?;
        Ok(SaleTotals {
            revenue: row.try_get("revenue").map_err(|e| decode_err("revenue", e))?,
            items: to_u64("items", items)?,
        })
    }

    async fn by_product(&self, filter: &SaleFilter) -> StoreResult<Vec<ProductRollup>> {
        let sql = format!(
            "SELECT product_id, SUM(quantity)::BIGINT AS total_sold, SUM(total)::FLOAT8 AS total_revenue \
             FROM sales WHERE {SALE_FILTER} \
             GROUP BY product_id ORDER BY total_revenue DESC, product_id ASC"
        );
        let rows = bind_sale_filter(sqlx::query(&sql), filter)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("sales_by_product", "sale", e))?;

        rows.iter()
            .map(|row| {
                let sold: i64 = row.try_get("total_sold").map_err(|e| decode_err("total_sold", e))?;
                Ok(ProductRollup {
                    product_id: ProductId::from_uuid(
                        row.try_get("product_id").map_err(|e| decode_err("product_id", e))?,
                    ),
                    total_sold: to_u64("total_sold", sold)?,
                    total_revenue: row
                        .try_get("total_revenue")
                        .map_err(|e| decode_err("total_revenue", e))?,
                })
            })
            .collect()
    }
}
