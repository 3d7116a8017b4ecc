use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use agristore_auth::{AccessPolicy, AuthzError, JwtValidator, Principal, authorize};

use crate::app::errors;
use crate::context::AuthContext;

/// Token validator plus the policy a route group enforces.
#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub policy: AccessPolicy,
}

impl AuthState {
    pub fn new(jwt: Arc<dyn JwtValidator>) -> Self {
        Self {
            jwt,
            policy: AccessPolicy::Authenticated,
        }
    }

    pub fn with_policy(&self, policy: AccessPolicy) -> Self {
        Self {
            jwt: Arc::clone(&self.jwt),
            policy,
        }
    }
}

/// Resolve the caller from the bearer token and enforce the route policy.
///
/// Under [`AccessPolicy::Optional`] a missing or invalid token just means an
/// anonymous request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let principal = match principal_from(&state, req.headers()) {
        Ok(p) => Some(p),
        Err(_) if state.policy == AccessPolicy::Optional => None,
        Err(reason) => {
            tracing::debug!(reason, "rejected bearer token");
            return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", reason);
        }
    };

    if let Err(e) = authorize(principal.as_ref(), state.policy) {
        let status = match e {
            AuthzError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthzError::Forbidden => StatusCode::FORBIDDEN,
        };
        let code = if status == StatusCode::FORBIDDEN { "forbidden" } else { "unauthorized" };
        return errors::json_error(status, code, e.to_string());
    }

    if let Some(principal) = principal {
        req.extensions_mut().insert(AuthContext::new(principal));
    }
    next.run(req).await
}

fn principal_from(state: &AuthState, headers: &HeaderMap) -> Result<Principal, &'static str> {
    let token = extract_bearer(headers)?;
    state
        .jwt
        .validate(token, Utc::now())
        .map(Principal::from)
        .map_err(|_| "invalid or expired token")
}

pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("authorization header required")?;

    let header = header
        .to_str()
        .map_err(|_| "invalid authorization header format")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("invalid authorization header format")?
        .trim();

    if token.is_empty() {
        return Err("invalid authorization header format");
    }

    Ok(token)
}
