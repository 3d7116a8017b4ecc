//! `agristore-auth`: credentials, session tokens and access policies.
//!
//! Decoupled from HTTP and storage: the API layer extracts bearer tokens,
//! the infra layer persists users.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{AccessPolicy, AuthzError, authorize};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use password::{Argon2Hasher, CredentialError, PasswordHasher};
pub use principal::Principal;
pub use roles::Role;
pub use token::{Hs256Jwt, JwtValidator, TokenIssuer};
pub use user::{MIN_PASSWORD_LEN, Registration, User, normalize_email};
