//! Product records, creation and partial update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agristore_core::{DomainError, DomainResult, Entity, Patch, ProductId};

use crate::image::{self, ProductImage, UploadedImage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub brand: String,
    /// Legacy single image; mirrors the primary image's URL.
    pub image_url: Option<String>,
    pub images: Vec<ProductImage>,
    pub stock: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Create input. Stock arrives signed so negatives surface as validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub brand: String,
    pub stock: i64,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub price: Patch<f64>,
    #[serde(default)]
    pub category: Patch<String>,
    #[serde(default)]
    pub brand: Patch<String>,
    #[serde(default)]
    pub stock: Patch<i64>,
    #[serde(default)]
    pub is_active: Patch<bool>,
    /// A non-empty list replaces the whole image collection.
    #[serde(default)]
    pub image_urls: Patch<Vec<String>>,
    #[serde(default)]
    pub image_url: Patch<String>,
}

pub fn validate_price(price: f64) -> DomainResult<f64> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(DomainError::validation("price must be greater than 0"))
    }
}

pub fn validate_stock(stock: i64) -> DomainResult<u32> {
    u32::try_from(stock).map_err(|_| DomainError::validation("stock must be a non-negative integer"))
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

impl Product {
    /// Validate input and build a new active product.
    ///
    /// `uploads` must already be validated and stored; they are placed ahead of
    /// URL images.
    pub fn create(input: NewProduct, uploads: Vec<UploadedImage>, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = required("name", &input.name)?;
        let category = required("category", &input.category)?;
        let price = validate_price(input.price)?;
        let stock = validate_stock(input.stock)?;

        let images = image::assemble(uploads, &input.image_urls, input.image_url.as_deref(), now);
        let mut product = Self {
            id: ProductId::new(),
            name,
            description: input.description.trim().to_string(),
            price,
            category,
            brand: input.brand.trim().to_string(),
            image_url: None,
            images,
            stock,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        product.sync_image_url();
        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// Everything is validated before anything changes. Returns the images
    /// that were dropped from the collection so their files can be removed.
    pub fn apply_patch(
        &mut self,
        patch: ProductPatch,
        uploads: Vec<UploadedImage>,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<ProductImage>> {
        let name = patch.name.map(|v| required("name", &v)).transpose()?;
        let category = patch.category.map(|v| required("category", &v)).transpose()?;
        let price = patch.price.map(validate_price).transpose()?;
        let stock = patch.stock.map(validate_stock).transpose()?;

        name.apply_to(&mut self.name);
        category.apply_to(&mut self.category);
        price.apply_to(&mut self.price);
        stock.apply_to(&mut self.stock);
        patch.description.map(|d| d.trim().to_string()).apply_to(&mut self.description);
        patch.brand.map(|b| b.trim().to_string()).apply_to(&mut self.brand);
        patch.is_active.apply_to(&mut self.is_active);

        let legacy = patch.image_url.into_option().filter(|u| !u.trim().is_empty());
        // Blank or empty URL lists leave the collection alone.
        let urls = patch
            .image_urls
            .into_option()
            .filter(|urls| urls.iter().any(|u| !u.trim().is_empty()))
            .unwrap_or_default();
        let mut discarded = Vec::new();
        if !uploads.is_empty() || !urls.is_empty() {
            let replacement = image::assemble(uploads, &urls, legacy.as_deref(), now);
            discarded = std::mem::replace(&mut self.images, replacement);
        } else if let Some(url) = legacy {
            image::promote_legacy_url(&mut self.images, url.trim(), now);
        }

        self.sync_image_url();
        self.updated_at = now;
        Ok(discarded)
    }

    /// Keep the legacy `image_url` field aligned with the primary image.
    pub fn sync_image_url(&mut self) {
        self.image_url = image::primary_url(&self.images);
    }

    /// Storage keys of every uploaded file backing this product's images.
    pub fn stored_paths(&self) -> Vec<String> {
        self.images
            .iter()
            .filter_map(|i| i.stored_path().map(str::to_string))
            .collect()
    }

    /// Monetary value of the units on hand.
    pub fn stock_value(&self) -> f64 {
        f64::from(self.stock) * self.price
    }
}

trait TransposePatch<T> {
    fn transpose(self) -> DomainResult<Patch<T>>;
}

impl<T> TransposePatch<T> for Patch<DomainResult<T>> {
    fn transpose(self) -> DomainResult<Patch<T>> {
        match self {
            Patch::Keep => Ok(Patch::Keep),
            Patch::Set(r) => r.map(Patch::Set),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::upload;

    fn input() -> NewProduct {
        NewProduct {
            name: "Chainsaw MS 250".into(),
            description: "45cc petrol chainsaw".into(),
            price: 349.99,
            category: "Power Tools".into(),
            brand: "Stihl".into(),
            stock: 12,
            ..NewProduct::default()
        }
    }

    #[test]
    fn create_defaults_to_active_without_images() {
        let product = Product::create(input(), vec![], Utc::now()).unwrap();
        assert!(product.is_active);
        assert!(product.images.is_empty());
        assert_eq!(product.image_url, None);
    }

    #[test]
    fn create_rejects_invalid_fields() {
        let cases = [
            NewProduct { name: " ".into(), ..input() },
            NewProduct { category: String::new(), ..input() },
            NewProduct { price: 0.0, ..input() },
            NewProduct { price: f64::NAN, ..input() },
            NewProduct { stock: -1, ..input() },
        ];
        for case in cases {
            assert!(matches!(
                Product::create(case, vec![], Utc::now()),
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[test]
    fn create_with_urls_mirrors_primary_into_legacy_field() {
        let product = Product::create(
            NewProduct {
                image_urls: vec!["https://x/1.png".into(), "https://x/2.png".into()],
                ..input()
            },
            vec![],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(product.image_url.as_deref(), Some("https://x/1.png"));
    }

    #[test]
    fn patch_distinguishes_absent_from_zero_and_empty() {
        let mut product = Product::create(input(), vec![], Utc::now()).unwrap();
        let patch = ProductPatch {
            stock: Patch::Set(0),
            brand: Patch::Set(String::new()),
            is_active: Patch::Set(false),
            ..ProductPatch::default()
        };
        product.apply_patch(patch, vec![], Utc::now()).unwrap();

        assert_eq!(product.stock, 0);
        assert_eq!(product.brand, "");
        assert!(!product.is_active);
        assert_eq!(product.name, "Chainsaw MS 250");
        assert_eq!(product.price, 349.99);
    }

    #[test]
    fn invalid_patch_changes_nothing() {
        let mut product = Product::create(input(), vec![], Utc::now()).unwrap();
        let before = product.clone();
        let patch = ProductPatch {
            name: Patch::Set("Renamed".into()),
            price: Patch::Set(0.0),
            ..ProductPatch::default()
        };
        assert!(product.apply_patch(patch, vec![], Utc::now()).is_err());
        assert_eq!(product, before);
    }

    #[test]
    fn new_uploads_replace_and_return_old_images() {
        let mut product = Product::create(input(), vec![upload("old.jpg")], Utc::now()).unwrap();
        let old_paths = product.stored_paths();

        let discarded = product
            .apply_patch(ProductPatch::default(), vec![upload("new.jpg")], Utc::now())
            .unwrap();

        assert_eq!(discarded.len(), 1);
        assert_eq!(discarded[0].stored_path().map(str::to_string), old_paths.first().cloned());
        assert_eq!(product.images.len(), 1);
        assert!(product.images[0].is_primary);
        assert_eq!(product.image_url.as_deref(), Some(product.images[0].url.as_str()));
    }

    #[test]
    fn empty_url_list_keeps_images() {
        let mut product = Product::create(
            NewProduct { image_url: Some("https://x/a.png".into()), ..input() },
            vec![],
            Utc::now(),
        )
        .unwrap();
        for urls in [vec![], vec!["  ".to_string()]] {
            let patch = ProductPatch { image_urls: Patch::Set(urls), ..ProductPatch::default() };
            let discarded = product.apply_patch(patch, vec![], Utc::now()).unwrap();

            assert!(discarded.is_empty());
            assert_eq!(product.images.len(), 1);
            assert_eq!(product.image_url.as_deref(), Some("https://x/a.png"));
        }
    }
}
