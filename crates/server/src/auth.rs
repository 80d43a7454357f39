//! Bearer-token authentication and the shared router state.
//!
//! `resolve_principal` runs on every request. It never rejects anything:
//! a missing, malformed or expired token simply leaves the request
//! unauthenticated, and the permission layer decides what that means for
//! the route. Resolved principals are cached under `auth:<token>` so the
//! store is not consulted on every request; the cache TTL bounds how long
//! a role change or deactivation can lag.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use service::{
    access::{Permission, Principal},
    accounts::{service::Claims, AccountService},
    cache::auth_key,
    catalog::CatalogService,
    ApiCache, Throttle,
};
use tracing::debug;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct ServerState {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub cache: Arc<ApiCache>,
    pub throttle: Option<Arc<Throttle>>,
    pub jwt_secret: String,
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn principal_for_token(state: &ServerState, token: &str) -> Option<Principal> {
    let key = auth_key(token);
    if let Some(cached) = state.cache.get(&key).await {
        if let Ok(p) = serde_json::from_str::<Principal>(&cached) {
            return Some(p);
        }
    }

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?
    .claims;

    // The token's uid is re-checked against the store so a deactivated or
    // deleted account stops resolving even before the token expires.
    let principal = state.accounts.resolve_principal(claims.uid).await.ok()??;
    if let Ok(json) = serde_json::to_string(&principal) {
        state.cache.set(key, json).await;
    }
    Some(principal)
}

/// Attach the authenticated `Principal` (if any) as a request extension.
pub async fn resolve_principal(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&req) {
        if let Some(principal) = principal_for_token(&state, token).await {
            debug!(user_id = %principal.id, role = %principal.role, "request authenticated");
            req.extensions_mut().insert(principal);
        }
    }
    next.run(req).await
}

/// Count authenticated requests against the per-role quota. Anonymous
/// requests pass through; the permission layer already denies them
/// everywhere a quota would matter.
pub async fn enforce_throttle(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let (Some(throttle), Some(principal)) =
        (state.throttle.as_ref(), req.extensions().get::<Principal>())
    {
        if !throttle.allow(principal).await {
            return Err(ApiError::Throttled);
        }
    }
    Ok(next.run(req).await)
}

/// Deny the request unless the resolved principal satisfies `perm`. The
/// denial body names the HTTP method and nothing else about the route.
pub async fn require_permission(
    perm: Permission,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req.extensions().get::<Principal>().copied();
    if !perm.allows(principal.as_ref()) {
        return Err(ApiError::Forbidden { method: req.method().to_string() });
    }
    Ok(next.run(req).await)
}
