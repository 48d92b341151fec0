/*
 * Responsibility
 * - Load settings from the environment (.env is honoured in development)
 * - Validate them once at startup (missing / malformed values abort the boot)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Where user records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStoreBackend {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

/// Signature algorithm expected on access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAlgorithm {
    Rs256,
    Es256,
    EdDsa,
}

impl FromStr for TokenAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RS256" => Ok(Self::Rs256),
            "ES256" => Ok(Self::Es256),
            "EDDSA" => Ok(Self::EdDsa),
            _ => Err(ConfigError::Invalid("ACCESS_JWT_ALGORITHM")),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    /// Optional prefix the routes are nested under (e.g. `/realms/acme/custom`).
    pub base_path: Option<String>,
    pub realm: String,
    pub user_store: UserStoreBackend,

    pub auth_issuer: String,
    pub auth_audience: Option<String>,
    pub access_token_leeway_seconds: u64,
    pub access_jwt_algorithm: TokenAlgorithm,
    pub access_jwt_public_key_pem: String,

    pub authz_server_url: Url,
    pub authz_realm: String,
    pub authz_client_id: String,
    pub authz_client_secret: String,

    pub request_timeout_seconds: u64,
    pub request_body_limit_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets stay out of logs
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("base_path", &self.base_path)
            .field("realm", &self.realm)
            .field("auth_issuer", &self.auth_issuer)
            .field("auth_audience", &self.auth_audience)
            .field("access_jwt_algorithm", &self.access_jwt_algorithm)
            .field("authz_server_url", &self.authz_server_url.as_str())
            .field("authz_realm", &self.authz_realm)
            .field("authz_client_id", &self.authz_client_id)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            var(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = match optional("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8080,
        };
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let base_path = match optional("BASE_PATH") {
            Some(raw) => normalize_base_path(&raw)?,
            None => None,
        };

        let realm = optional("REALM").unwrap_or_else(|| "master".to_string());

        let user_store = match optional("USER_STORE")
            .unwrap_or_else(|| "postgres".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => UserStoreBackend::Postgres {
                database_url: required("DATABASE_URL")?,
                max_connections: parse_or(&optional, "DATABASE_MAX_CONNECTIONS", 5)?,
            },
            "memory" => UserStoreBackend::Memory,
            _ => return Err(ConfigError::Invalid("USER_STORE")),
        };

        let auth_issuer = required("AUTH_ISSUER")?;
        let auth_audience = optional("AUTH_AUDIENCE");
        let access_token_leeway_seconds = parse_or(&optional, "ACCESS_TOKEN_LEEWAY_SECONDS", 60)?;
        let access_jwt_algorithm = match optional("ACCESS_JWT_ALGORITHM") {
            Some(raw) => raw.parse()?,
            None => TokenAlgorithm::Rs256,
        };
        // PEMs are often passed through env files on a single line
        let access_jwt_public_key_pem =
            required("ACCESS_JWT_PUBLIC_KEY_PEM")?.replace("\\n", "\n");

        let authz_server_url = Url::parse(&required("AUTHZ_SERVER_URL")?)
            .map_err(|_| ConfigError::Invalid("AUTHZ_SERVER_URL"))?;
        if !matches!(authz_server_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid("AUTHZ_SERVER_URL"));
        }
        let authz_realm = optional("AUTHZ_REALM").unwrap_or_else(|| realm.clone());
        let authz_client_id = required("AUTHZ_CLIENT_ID")?;
        let authz_client_secret = required("AUTHZ_CLIENT_SECRET")?;

        let request_timeout_seconds = parse_or(&optional, "REQUEST_TIMEOUT_SECONDS", 30)?;
        let request_body_limit_bytes =
            parse_or(&optional, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;

        Ok(Self {
            addr,
            app_env,
            base_path,
            realm,
            user_store,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            access_jwt_algorithm,
            access_jwt_public_key_pem,
            authz_server_url,
            authz_realm,
            authz_client_id,
            authz_client_secret,
            request_timeout_seconds,
            request_body_limit_bytes,
        })
    }
}

fn parse_or<T, F>(optional: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match optional(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

// "/" and "" mean "mount at the root"; anything else must be an absolute path.
fn normalize_base_path(raw: &str) -> Result<Option<String>, ConfigError> {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !trimmed.starts_with('/') || trimmed.contains("//") {
        return Err(ConfigError::Invalid("BASE_PATH"));
    }
    Ok(Some(trimmed.to_string()))
}
