//! Factory: build the authorization gate from application `Config`.
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::services::auth::{AuthzGate, TokenVerifier, UmaPermissionClient};

pub fn build_authz_gate(config: &Config) -> Result<Arc<AuthzGate>, ConfigError> {
    let verifier = TokenVerifier::new(
        &config.access_jwt_public_key_pem,
        config.access_jwt_algorithm,
        &config.auth_issuer,
        config.auth_audience.as_deref(),
        config.access_token_leeway_seconds,
    )
    .map_err(|err| {
        tracing::error!(error = %err, "cannot build access token verifier");
        ConfigError::Invalid("ACCESS_JWT_PUBLIC_KEY_PEM")
    })?;

    let permissions = UmaPermissionClient::from_config(config);

    Ok(Arc::new(AuthzGate::new(
        Arc::new(verifier),
        Arc::new(permissions),
    )))
}
