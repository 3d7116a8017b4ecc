//! Development data: an admin account and a small sample catalog.

use agristore_catalog::{NewCategory, NewProduct, ProductFilter};
use agristore_core::{DomainError, PageRequest};

use crate::services::{ServiceError, ServiceResult, Services};

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub admin_email: String,
    pub admin_password: String,
}

/// What a seeding run actually created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub categories: usize,
    pub products: usize,
}

struct SampleProduct {
    name: &'static str,
    description: &'static str,
    price: f64,
    category: &'static str,
    brand: &'static str,
    stock: i64,
}

const SAMPLE_PRODUCTS: &[SampleProduct] = &[
    SampleProduct {
        name: "Compact Utility Tractor 25HP",
        description: "Diesel, four-wheel drive, front loader mount",
        price: 24_500.00,
        category: "Tractors",
        brand: "FieldMaster",
        stock: 4,
    },
    SampleProduct {
        name: "Riding Mower 42in",
        description: "17.5 HP engine, hydrostatic transmission",
        price: 2_199.99,
        category: "Lawn Mowers",
        brand: "GreenCut",
        stock: 12,
    },
    SampleProduct {
        name: "Chainsaw 18in Pro",
        description: "50cc two-stroke, anti-vibration handle",
        price: 349.00,
        category: "Chainsaws",
        brand: "TimberLine",
        stock: 20,
    },
    SampleProduct {
        name: "Backpack Sprayer 16L",
        description: "Adjustable brass nozzle, padded straps",
        price: 89.50,
        category: "Sprayers",
        brand: "AgriFlow",
        stock: 7,
    },
    SampleProduct {
        name: "Drip Irrigation Kit 100m",
        description: "Pressure-compensating emitters and fittings",
        price: 129.00,
        category: "Irrigation",
        brand: "AgriFlow",
        stock: 30,
    },
];

/// Create the admin account if it is missing, and the sample catalog if no
/// products exist yet. Safe to run on every start.
pub async fn run(services: &Services, config: &SeedConfig) -> ServiceResult<SeedReport> {
    let mut report = SeedReport {
        admin_created: services
            .auth
            .ensure_admin(&config.admin_email, &config.admin_password, "Administrator")
            .await?,
        ..SeedReport::default()
    };
    if report.admin_created {
        tracing::info!(email = %config.admin_email, "seeded admin account");
    }

    let existing = services
        .products
        .list(ProductFilter::default(), PageRequest::new(Some(1), Some(1)))
        .await?;
    if existing.total > 0 {
        tracing::info!(products = existing.total, "catalog not empty, skipping sample data");
        return Ok(report);
    }

    let mut categories: Vec<&str> = SAMPLE_PRODUCTS.iter().map(|p| p.category).collect();
    categories.sort_unstable();
    categories.dedup();
    for name in categories {
        match services.categories.create(NewCategory { name: name.to_string() }).await {
            Ok(_) => report.categories += 1,
            Err(ServiceError::Domain(DomainError::Conflict(_))) => {}
            Err(e) => return Err(e),
        }
    }

    for sample in SAMPLE_PRODUCTS {
        let input = NewProduct {
            name: sample.name.to_string(),
            description: sample.description.to_string(),
            price: sample.price,
            category: sample.category.to_string(),
            brand: sample.brand.to_string(),
            stock: sample.stock,
            ..NewProduct::default()
        };
        services.products.create(input, Vec::new()).await?;
        report.products += 1;
    }

    tracing::info!(
        categories = report.categories,
        products = report.products,
        "seeded sample catalog"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use agristore_auth::{Argon2Hasher, Hs256Jwt};

    use crate::services::Repositories;
    use crate::uploads::{LocalImageStore, UploadConfig};

    fn services(root: &std::path::Path) -> Services {
        Services::new(
            Repositories::in_memory(),
            Arc::new(Argon2Hasher::new()),
            Arc::new(Hs256Jwt::new(b"seed-test", Duration::hours(1))),
            Arc::new(LocalImageStore::new(UploadConfig {
                root: root.to_path_buf(),
                public_base_url: "http://localhost:8082".into(),
            })),
        )
    }

    #[tokio::test]
    async fn seeding_twice_only_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let services = services(dir.path());
        let config = SeedConfig {
            admin_email: "admin@agristore.local".into(),
            admin_password: "password123".into(),
        };

        let first = run(&services, &config).await.unwrap();
        assert!(first.admin_created);
        assert_eq!(first.products, SAMPLE_PRODUCTS.len());
        assert_eq!(first.categories, 5);

        let second = run(&services, &config).await.unwrap();
        assert_eq!(second, SeedReport::default());

        let session = services.auth.login("admin@agristore.local", "password123").await.unwrap();
        assert!(session.user.role.is_admin());
    }
}
