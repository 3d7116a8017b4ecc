use agristore_auth::Principal;
use agristore_core::UserId;

/// The authenticated caller, attached to the request by the auth middleware.
///
/// Absent on anonymous requests to routes with an optional policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    principal: Principal,
}

impl AuthContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.principal.is_admin()
    }
}
