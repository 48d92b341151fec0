//! Permission-ticket exchange with the authorization service.
//!
//! The gate only needs "give me a ticket for this resource + scopes"; the UMA
//! protection API client below is the production implementation.
//!
//! Flow per request:
//! 1. client-credentials grant at `/realms/{realm}/protocol/openid-connect/token`
//!    to obtain a protection API token (PAT)
//! 2. `POST /realms/{realm}/authz/protection/permission` with the PAT
//!
//! Nothing is cached between requests.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::Config;

/// Permission request body, as the protection API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRequest {
    pub resource_id: String,
    pub resource_scopes: Vec<String>,
}

impl PermissionRequest {
    pub fn new(resource_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_scopes: vec![scope.into()],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionResponse {
    #[serde(default)]
    pub ticket: Option<String>,
}

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("invalid authorization service endpoint")]
    InvalidEndpoint,
    #[error("authorization service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("authorization service returned {status} from {endpoint}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("token endpoint response carried no access_token")]
    MissingAccessToken,
}

#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn create_ticket(
        &self,
        request: &PermissionRequest,
    ) -> Result<PermissionResponse, PermissionError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Client for a UMA 2.0 protection API (Keycloak layout).
#[derive(Clone)]
pub struct UmaPermissionClient {
    client: Client,
    server_url: Url,
    realm: String,
    client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for UmaPermissionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UmaPermissionClient")
            .field("server_url", &self.server_url.as_str())
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl UmaPermissionClient {
    pub fn new(
        server_url: Url,
        realm: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            server_url,
            realm: realm.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.authz_server_url.clone(),
            config.authz_realm.clone(),
            config.authz_client_id.clone(),
            config.authz_client_secret.clone(),
        )
    }

    // `{server}/realms/{realm}/<tail...>`, with the realm percent-encoded.
    fn endpoint(&self, tail: &[&str]) -> Result<Url, PermissionError> {
        let mut url = self.server_url.clone();
        url.path_segments_mut()
            .map_err(|_| PermissionError::InvalidEndpoint)?
            .pop_if_empty()
            .push("realms")
            .push(&self.realm)
            .extend(tail);
        Ok(url)
    }

    #[tracing::instrument(name = "obtain protection api token", skip(self))]
    async fn protection_token(&self) -> Result<String, PermissionError> {
        let url = self.endpoint(&["protocol", "openid-connect", "token"])?;

        let response = self
            .client
            .post(url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PermissionError::Status {
                endpoint: "token",
                status: response.status().as_u16(),
            });
        }

        response
            .json::<TokenResponse>()
            .await?
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(PermissionError::MissingAccessToken)
    }
}

#[async_trait]
impl PermissionService for UmaPermissionClient {
    #[tracing::instrument(
        name = "create permission ticket",
        skip(self, request),
        fields(resource_id = %request.resource_id)
    )]
    async fn create_ticket(
        &self,
        request: &PermissionRequest,
    ) -> Result<PermissionResponse, PermissionError> {
        let pat = self.protection_token().await?;
        let url = self.endpoint(&["authz", "protection", "permission"])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(pat)
            .json(&[request])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PermissionError::Status {
                endpoint: "permission",
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<PermissionResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_realm_scoped_endpoints() {
        let client = UmaPermissionClient::new(
            Url::parse("https://id.example.com/auth/").unwrap(),
            "acme corp",
            "user-api",
            "secret",
        );

        let url = client.endpoint(&["authz", "protection", "permission"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://id.example.com/auth/realms/acme%20corp/authz/protection/permission"
        );
    }

    #[test]
    fn serializes_permission_request() {
        let body = serde_json::to_value([&PermissionRequest::new("addUser", "add-user")]).unwrap();
        assert_eq!(
            body,
            serde_json::json!([{"resource_id": "addUser", "resource_scopes": ["add-user"]}])
        );
    }

    #[test]
    fn debug_hides_client_secret() {
        let client = UmaPermissionClient::new(
            Url::parse("https://id.example.com").unwrap(),
            "acme",
            "user-api",
            "super-secret",
        );
        assert!(!format!("{client:?}").contains("super-secret"));
    }
}
