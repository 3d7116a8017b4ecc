//! User accounts and registration rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agristore_core::{DomainError, DomainResult, Entity, UserId};

use crate::Role;

pub const MIN_PASSWORD_LEN: usize = 6;

/// A stored user account.
///
/// The password hash never leaves the process through serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Registration input as received from a client.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl Registration {
    /// Check the input and normalize the email in place.
    pub fn validate(&mut self) -> DomainResult<()> {
        self.email = normalize_email(&self.email);
        if !is_plausible_email(&self.email) {
            return Err(DomainError::validation("email must be a valid address"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        Ok(())
    }

    /// Build the account record. `password_hash` must already be hashed.
    pub fn into_user(self, password_hash: String, now: DateTime<Utc>) -> User {
        User {
            id: UserId::new(),
            email: self.email,
            password_hash,
            name: self.name,
            role: self.role.unwrap_or_default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Emails compare case-insensitively and without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        _ => false,
    }
}
