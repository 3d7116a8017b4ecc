//! Server configuration, from command-line flags or the environment.

use std::path::PathBuf;

use clap::Parser;

use agristore_observability::LogFormat;

/// Signing key used when none is configured. Only fit for local runs.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Longest accepted session lifetime: one year.
pub const MAX_JWT_TTL_HOURS: i64 = 24 * 365;

/// Agricultural equipment store API server
#[derive(Debug, Clone, Parser)]
#[command(name = "agristore-api", about = "Agricultural equipment store API", long_about = None)]
pub struct AppConfig {
    /// Bind address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Bind port
    #[arg(short, long, env = "PORT", default_value_t = 8082)]
    pub port: u16,

    /// `PostgreSQL` connection string; in-memory storage when unset
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// HS256 signing key for session tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Session token lifetime in hours (1 to 8760)
    #[arg(
        long,
        env = "JWT_TTL_HOURS",
        default_value_t = 24,
        value_parser = clap::value_parser!(u16).range(1..=MAX_JWT_TTL_HOURS)
    )]
    pub jwt_ttl_hours: u16,

    /// Origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:3000")]
    pub frontend_url: String,

    /// Base URL used when building links to uploaded images
    #[arg(long, env = "PUBLIC_BASE_URL", default_value = "http://localhost:8082")]
    pub public_base_url: String,

    /// Directory uploaded files are written to and served from
    #[arg(long, env = "UPLOAD_ROOT", default_value = "uploads")]
    pub upload_root: PathBuf,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 32 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Log output: json or pretty
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,

    /// Create the admin account and a sample catalog on start
    #[arg(long, env = "SEED")]
    pub seed: bool,

    /// Seeded admin login
    #[arg(long, env = "ADMIN_EMAIL", default_value = "admin@agristore.local")]
    pub admin_email: String,

    /// Seeded admin password
    #[arg(long, env = "ADMIN_PASSWORD", default_value = "password123", hide_env_values = true)]
    pub admin_password: String,
}

impl AppConfig {
    /// Load `.env` if present, then parse flags and environment.
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();
        Self::try_parse()
    }

    /// Defaults only, ignoring the process's flags and environment.
    pub fn defaults() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8082,
            database_url: None,
            jwt_secret: None,
            jwt_ttl_hours: 24,
            frontend_url: "http://localhost:3000".into(),
            public_base_url: "http://localhost:8082".into(),
            upload_root: PathBuf::from("uploads"),
            max_body_bytes: 32 * 1024 * 1024,
            log_format: LogFormat::Json,
            seed: false,
            admin_email: "admin@agristore.local".into(),
            admin_password: "password123".into(),
        }
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured secret, or the development default.
    pub fn jwt_secret(&self) -> &str {
        self.jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEV_JWT_SECRET)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret() == DEV_JWT_SECRET
    }
}
