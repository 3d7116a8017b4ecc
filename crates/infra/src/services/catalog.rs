//! Product and category management.

use std::sync::Arc;

use chrono::Utc;

use agristore_catalog::{Category, NewCategory, NewProduct, Product, ProductFilter, ProductPatch};
use agristore_core::{CategoryId, DomainError, Page, PageRequest, ProductId};

use super::ServiceResult;
use crate::store::{CategoryRepository, ProductRepository};
use crate::uploads::{IncomingFile, LocalImageStore};

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    uploads: Arc<LocalImageStore>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>, uploads: Arc<LocalImageStore>) -> Self {
        Self { products, uploads }
    }

    /// Store the uploaded files, then persist the product.
    ///
    /// Files written for a product that is never persisted are removed again.
    pub async fn create(&self, input: NewProduct, files: Vec<IncomingFile>) -> ServiceResult<Product> {
        let uploads = self.uploads.store_all(&files).await?;
        let keys: Vec<String> = uploads.iter().map(|u| u.file.path.clone()).collect();

        let product = match Product::create(input, uploads, Utc::now()) {
            Ok(p) => p,
            Err(e) => {
                self.uploads.discard(keys).await;
                return Err(e.into());
            }
        };
        if let Err(e) = self.products.insert(&product).await {
            self.uploads.discard(keys).await;
            return Err(e.into());
        }

        tracing::info!(
            product_id = %product.id,
            images = product.images.len(),
            "product created"
        );
        Ok(product)
    }

    pub async fn get(&self, id: ProductId) -> ServiceResult<Product> {
        self.products
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product").into())
    }

    pub async fn list(&self, filter: ProductFilter, page: PageRequest) -> ServiceResult<Page<Product>> {
        let filter = filter.normalized();
        let items = self.products.list(&filter, page).await?;
        let total = self.products.count(&filter).await?;
        Ok(Page::new(items, total, page))
    }

    /// Partial update. A new image set replaces the old one and the files
    /// behind replaced images are removed once the update is stored.
    pub async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
        files: Vec<IncomingFile>,
    ) -> ServiceResult<Product> {
        let mut product = self.get(id).await?;
        let sets_stock = patch.stock.is_set();

        let uploads = self.uploads.store_all(&files).await?;
        let keys: Vec<String> = uploads.iter().map(|u| u.file.path.clone()).collect();
        let now = Utc::now();

        let discarded = match product.apply_patch(patch, uploads, now) {
            Ok(d) => d,
            Err(e) => {
                self.uploads.discard(keys).await;
                return Err(e.into());
            }
        };

        let stored = match self.products.update(&product).await {
            Ok(true) if sets_stock => self.products.set_stock(id, product.stock, now).await,
            other => other,
        };
        match stored {
            Ok(true) => {}
            Ok(false) => {
                self.uploads.discard(keys).await;
                return Err(DomainError::not_found("product").into());
            }
            Err(e) => {
                self.uploads.discard(keys).await;
                return Err(e.into());
            }
        }

        let stale: Vec<String> = discarded
            .iter()
            .filter_map(|i| i.stored_path().map(str::to_string))
            .collect();
        self.uploads.discard(stale).await;

        tracing::info!(product_id = %id, "product updated");
        // Stock may have moved concurrently; return what is stored.
        self.get(id).await
    }

    /// Remove the product and every uploaded file behind its images.
    pub async fn delete(&self, id: ProductId) -> ServiceResult<()> {
        let product = self.get(id).await?;
        if !self.products.delete(id).await? {
            return Err(DomainError::not_found("product").into());
        }
        self.uploads.discard(product.stored_paths()).await;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    pub async fn create(&self, input: NewCategory) -> ServiceResult<Category> {
        let category = input.into_category(Utc::now())?;
        if self.categories.find_by_name(&category.name).await?.is_some() {
            return Err(DomainError::conflict("category already exists").into());
        }
        self.categories.insert(&category).await?;
        tracing::info!(category_id = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn get(&self, id: CategoryId) -> ServiceResult<Category> {
        self.categories
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("category").into())
    }

    pub async fn list(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.categories.list().await?)
    }

    pub async fn delete(&self, id: CategoryId) -> ServiceResult<()> {
        if !self.categories.delete(id).await? {
            return Err(DomainError::not_found("category").into());
        }
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agristore_core::Patch;

    use crate::services::ServiceError;
    use crate::store::{InMemoryCategoryRepository, InMemoryProductRepository};
    use crate::uploads::UploadConfig;

    fn png(name: &str) -> IncomingFile {
        IncomingFile {
            filename: name.into(),
            content_type: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    fn products(root: &std::path::Path) -> ProductService {
        ProductService::new(
            Arc::new(InMemoryProductRepository::new()),
            Arc::new(LocalImageStore::new(UploadConfig {
                root: root.to_path_buf(),
                public_base_url: "http://localhost:8082".into(),
            })),
        )
    }

    fn tractor() -> NewProduct {
        NewProduct {
            name: "Tractor".into(),
            price: 15000.0,
            category: "Machinery".into(),
            stock: 3,
            ..NewProduct::default()
        }
    }

    #[tokio::test]
    async fn create_with_upload_and_url() {
        let dir = tempfile::tempdir().unwrap();
        let svc = products(dir.path());
        let input = NewProduct {
            image_urls: vec!["https://cdn.test/a.jpg".into()],
            ..tractor()
        };

        let product = svc.create(input, vec![png("front.png")]).await.unwrap();

        assert_eq!(product.images.len(), 2);
        assert_eq!(product.images.iter().filter(|i| i.is_primary).count(), 1);
        let primary = &product.images[0];
        assert!(primary.is_primary && !primary.is_url());
        assert_eq!(product.image_url.as_deref(), Some(primary.url.as_str()));
        assert!(dir.path().join(primary.stored_path().unwrap()).exists());
    }

    #[tokio::test]
    async fn invalid_product_leaves_no_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let svc = products(dir.path());
        let input = NewProduct { price: 0.0, ..tractor() };

        let err = svc.create(input, vec![png("a.png")]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));

        let files = std::fs::read_dir(dir.path().join("products")).unwrap().count();
        assert_eq!(files, 0);
    }

    #[tokio::test]
    async fn replacing_images_removes_old_files() {
        let dir = tempfile::tempdir().unwrap();
        let svc = products(dir.path());
        let product = svc.create(tractor(), vec![png("old.png")]).await.unwrap();
        let old_key = product.stored_paths().remove(0);

        let patch = ProductPatch {
            image_urls: Patch::Set(vec!["https://cdn.test/new.jpg".into()]),
            ..ProductPatch::default()
        };
        let updated = svc.update(product.id, patch, Vec::new()).await.unwrap();

        assert_eq!(updated.images.len(), 1);
        assert_eq!(updated.image_url.as_deref(), Some("https://cdn.test/new.jpg"));
        assert!(!dir.path().join(old_key).exists());
    }

    #[tokio::test]
    async fn update_persists_stock_and_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let svc = products(dir.path());
        let product = svc.create(tractor(), Vec::new()).await.unwrap();

        let patch = ProductPatch {
            stock: Patch::Set(42),
            price: Patch::Set(14500.0),
            ..ProductPatch::default()
        };
        let updated = svc.update(product.id, patch, Vec::new()).await.unwrap();

        assert_eq!(updated.stock, 42);
        assert_eq!(updated.price, 14500.0);
        assert_eq!(updated.name, "Tractor");
    }

    #[tokio::test]
    async fn negative_stock_update_is_rejected_and_nothing_changes() {
        let dir = tempfile::tempdir().unwrap();
        let svc = products(dir.path());
        let product = svc.create(tractor(), Vec::new()).await.unwrap();

        let patch = ProductPatch {
            stock: Patch::Set(-1),
            name: Patch::Set("Renamed".into()),
            ..ProductPatch::default()
        };
        assert!(svc.update(product.id, patch, Vec::new()).await.is_err());
        assert_eq!(svc.get(product.id).await.unwrap(), product);
    }

    #[tokio::test]
    async fn delete_removes_files_and_then_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let svc = products(dir.path());
        let product = svc.create(tractor(), vec![png("a.png")]).await.unwrap();
        let key = product.stored_paths().remove(0);

        svc.delete(product.id).await.unwrap();

        assert!(!dir.path().join(key).exists());
        let err = svc.delete(product.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let svc = products(dir.path());
        for name in ["A", "B", "C"] {
            svc.create(NewProduct { name: name.into(), ..tractor() }, Vec::new())
                .await
                .unwrap();
        }

        let page = svc
            .list(ProductFilter::default(), PageRequest::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].created_at >= page.items[1].created_at);
    }

    #[tokio::test]
    async fn duplicate_category_conflicts() {
        let svc = CategoryService::new(Arc::new(InMemoryCategoryRepository::new()));
        svc.create(NewCategory { name: "Seeds".into() }).await.unwrap();

        let err = svc.create(NewCategory { name: " Seeds ".into() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn created_category_is_found_by_name() {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let svc = CategoryService::new(repo.clone());
        let created = svc.create(NewCategory { name: "  Irrigation ".into() }).await.unwrap();

        let found = repo.find_by_name("Irrigation").await.unwrap().unwrap();
        assert_eq!(found.name, "Irrigation");
        assert_eq!(found.id, created.id);
        assert!(!found.id.as_uuid().is_nil());

        let listed = svc.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(svc.get(created.id).await.unwrap().name, "Irrigation");
    }

    #[tokio::test]
    async fn deleting_unknown_category_is_not_found() {
        let svc = CategoryService::new(Arc::new(InMemoryCategoryRepository::new()));
        let err = svc.delete(CategoryId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(_))));
    }
}
