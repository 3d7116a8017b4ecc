use thiserror::Error;

use crate::Principal;

/// Access policy attached to a route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Attach the principal when a valid token is present; never reject.
    Optional,
    /// A valid token is required.
    Authenticated,
    /// A valid token with the admin role is required.
    Admin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("admin role required")]
    Forbidden,
}

/// Pure policy check: no IO, no panics.
pub fn authorize(principal: Option<&Principal>, policy: AccessPolicy) -> Result<(), AuthzError> {
    match (policy, principal) {
        (AccessPolicy::Optional, _) => Ok(()),
        (_, None) => Err(AuthzError::Unauthenticated),
        (AccessPolicy::Authenticated, Some(_)) => Ok(()),
        (AccessPolicy::Admin, Some(p)) if p.is_admin() => Ok(()),
        (AccessPolicy::Admin, Some(_)) => Err(AuthzError::Forbidden),
    }
}
