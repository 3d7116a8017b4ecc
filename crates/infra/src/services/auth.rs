//! Registration, login and profile lookup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use agristore_auth::{
    PasswordHasher, Registration, Role, SessionClaims, TokenIssuer, User, normalize_email,
};
use agristore_core::{DomainError, UserId};

use super::{ServiceError, ServiceResult};
use crate::store::UserRepository;

/// A signed session plus the account it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self { users, hasher, tokens }
    }

    pub async fn register(&self, mut registration: Registration) -> ServiceResult<User> {
        registration.validate()?;
        if self.users.find_by_email(&registration.email).await?.is_some() {
            return Err(DomainError::conflict("user already exists").into());
        }

        let hash = self.hash(registration.password.clone()).await?;
        let user = registration.into_user(hash, Utc::now());
        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Unknown email, inactive account and wrong password are indistinguishable.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<Session> {
        let email = normalize_email(email);
        let user = match self.users.find_by_email(&email).await? {
            Some(u) if u.is_active => u,
            _ => return Err(DomainError::Unauthorized.into()),
        };

        if !self.verify(password.to_string(), user.password_hash.clone()).await? {
            return Err(DomainError::Unauthorized.into());
        }

        let claims = SessionClaims::new(user.id, user.email.clone(), user.role, Utc::now(), self.tokens.ttl());
        let token = self
            .tokens
            .issue(&claims)
            .map_err(|e| ServiceError::storage(format!("token signing failed: {e}")))?;
        let expires_at = claims.expires_at().unwrap_or_else(Utc::now);

        Ok(Session { token, expires_at, user })
    }

    pub async fn profile(&self, user_id: UserId) -> ServiceResult<User> {
        self.users
            .get(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user").into())
    }

    /// Create an admin account unless the email is already registered.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, email: &str, password: &str, name: &str) -> ServiceResult<bool> {
        if self.users.find_by_email(&normalize_email(email)).await?.is_some() {
            return Ok(false);
        }
        self.register(Registration {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            role: Some(Role::Admin),
        })
        .await?;
        Ok(true)
    }

    async fn hash(&self, password: String) -> ServiceResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ServiceError::storage(format!("hashing task failed: {e}")))?
            .map_err(ServiceError::from)
    }

    async fn verify(&self, password: String, hash: String) -> ServiceResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| ServiceError::storage(format!("hashing task failed: {e}")))?
            .map_err(ServiceError::from)
    }
}
