//! Per-route permission guard.
//!
//! Runs before the handler (and before the request body is read), pulls the
//! bearer token from `Authorization` and asks the authorization gate for the
//! route's permission. Any denial becomes the same 403 response.
//!
//! ```ignore
//! .route("/addUser", access::require(post(create_user), state.gate.clone(), ADD_USER))
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::constants::Permission;
use crate::error::AppError;
use crate::services::auth::AuthzGate;
use crate::state::AppState;

#[derive(Clone)]
struct Guard {
    gate: Arc<AuthzGate>,
    permission: Permission,
}

/// Wrap `route` so it only runs once `permission` has been granted.
pub fn require(
    route: MethodRouter<AppState>,
    gate: Arc<AuthzGate>,
    permission: Permission,
) -> MethodRouter<AppState> {
    // route_layer: unmatched methods still get 405 instead of 403
    route.route_layer(middleware::from_fn_with_state(
        Guard { gate, permission },
        guard_middleware,
    ))
}

/// `Authorization: Bearer <token>`; any other shape is treated as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

async fn guard_middleware(
    State(guard): State<Guard>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers());

    if !guard
        .gate
        .authorize(token.as_deref(), guard.permission)
        .await
    {
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}
