//! Storage and service wiring for the HTTP layer.

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;

use agristore_auth::{Argon2Hasher, Hs256Jwt};
use agristore_infra::seed::{self, SeedConfig};
use agristore_infra::services::{Repositories, Services};
use agristore_infra::store::apply_schema;
use agristore_infra::uploads::{LocalImageStore, UploadConfig};

use crate::config::AppConfig;

/// Pick the storage backend, build the services and optionally seed them.
///
/// Returns the services together with the token signer the auth middleware
/// validates against.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<(Services, Arc<Hs256Jwt>)> {
    let repos = match config.database_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("failed to connect to postgres")?;
            apply_schema(&pool).await.context("failed to apply schema")?;
            tracing::info!(backend = "postgres", "storage ready");
            Repositories::postgres(pool)
        }
        None => {
            tracing::info!(backend = "in-memory", "storage ready; data is lost on restart");
            Repositories::in_memory()
        }
    };

    tokio::fs::create_dir_all(&config.upload_root)
        .await
        .with_context(|| format!("failed to create upload root {}", config.upload_root.display()))?;
    let uploads = Arc::new(LocalImageStore::new(UploadConfig {
        root: config.upload_root.clone(),
        public_base_url: config.public_base_url.clone(),
    }));

    let jwt = Arc::new(Hs256Jwt::new(
        config.jwt_secret().as_bytes(),
        Duration::hours(i64::from(config.jwt_ttl_hours)),
    ));
    let services = Services::new(repos, Arc::new(Argon2Hasher::new()), jwt.clone(), uploads);

    if config.seed {
        let seed_config = SeedConfig {
            admin_email: config.admin_email.clone(),
            admin_password: config.admin_password.clone(),
        };
        seed::run(&services, &seed_config)
            .await
            .context("seeding failed")?;
    }

    Ok((services, jwt))
}
