use axum::{Router, middleware::from_fn_with_state};

use agristore_auth::AccessPolicy;

use crate::middleware::{AuthState, auth_middleware};

pub mod auth;
pub mod categories;
pub mod inventory;
pub mod products;
pub mod sales;
pub mod system;

/// Routes mounted under `/api`.
pub fn router(auth: &AuthState) -> Router {
    Router::new()
        .nest("/auth", auth::router(auth))
        .nest("/products", products::router(auth))
        .nest("/categories", categories::router(auth))
        .nest("/inventories", inventory::router(auth))
        .nest("/sales", sales::router(auth))
}

/// Wrap `routes` in the auth middleware enforcing `policy`.
pub(crate) fn guarded(routes: Router, auth: &AuthState, policy: AccessPolicy) -> Router {
    routes.route_layer(from_fn_with_state(auth.with_policy(policy), auth_middleware))
}
