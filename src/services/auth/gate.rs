/*
 * Responsibility
 * - Decide allow / deny for one (token, permission) pair
 *   1. token present  2. token verifies  3. required scope granted
 *   4. authorization service issues a non-empty ticket
 * - Every denial is logged with its reason, then collapsed to `false`
 */
use std::sync::Arc;

use thiserror::Error;

use crate::constants::Permission;
use crate::services::auth::access_jwt::{AccessJwtError, TokenVerifier};
use crate::services::auth::permission::{PermissionError, PermissionRequest, PermissionService};

/// Why a request was denied. Never sent to the caller.
#[derive(Debug, Error)]
pub enum Denial {
    #[error("token is missing")]
    MissingToken,
    #[error("token verification failed")]
    TokenInvalid(#[source] AccessJwtError),
    #[error("token lacks scope '{0}'")]
    ScopeDenied(&'static str),
    #[error("authorization service refused the permission request")]
    PermissionDenied(#[source] PermissionError),
    #[error("authorization service returned no ticket")]
    EmptyTicket,
}

#[derive(Clone)]
pub struct AuthzGate {
    verifier: Arc<TokenVerifier>,
    permissions: Arc<dyn PermissionService>,
}

impl AuthzGate {
    pub fn new(verifier: Arc<TokenVerifier>, permissions: Arc<dyn PermissionService>) -> Self {
        Self {
            verifier,
            permissions,
        }
    }

    /// `true` only when every check passes.
    pub async fn authorize(&self, token: Option<&str>, permission: Permission) -> bool {
        match self.check(token, permission).await {
            Ok(()) => true,
            Err(Denial::PermissionDenied(err)) => {
                tracing::error!(
                    error = %err,
                    scope = permission.scope,
                    resource_id = permission.resource_id,
                    "cannot authorize the request"
                );
                false
            }
            Err(denial) => {
                tracing::warn!(
                    reason = %denial,
                    error = ?std::error::Error::source(&denial),
                    scope = permission.scope,
                    resource_id = permission.resource_id,
                    "request denied"
                );
                false
            }
        }
    }

    pub async fn check(&self, token: Option<&str>, permission: Permission) -> Result<(), Denial> {
        let token = token.ok_or(Denial::MissingToken)?;

        let verified = self.verifier.verify(token).map_err(Denial::TokenInvalid)?;

        if !verified.has_scope(permission.scope) {
            return Err(Denial::ScopeDenied(permission.scope));
        }

        let request = PermissionRequest::new(permission.resource_id, permission.scope);
        let response = self
            .permissions
            .create_ticket(&request)
            .await
            .map_err(Denial::PermissionDenied)?;

        match response.ticket.as_deref() {
            Some(ticket) if !ticket.is_empty() => {
                tracing::info!(
                    subject = %verified.subject,
                    username = verified.username.as_deref().unwrap_or("-"),
                    client_id = verified.client_id.as_deref().unwrap_or("-"),
                    resource_id = permission.resource_id,
                    "permission ticket granted"
                );
                Ok(())
            }
            _ => Err(Denial::EmptyTicket),
        }
    }
}
