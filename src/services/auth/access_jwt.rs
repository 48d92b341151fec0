use std::collections::BTreeSet;
use std::{error::Error as StdError, fmt};

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::config::TokenAlgorithm;

// Errors returned by access-token verification + strict claim validation.
#[derive(Debug)]
pub enum AccessJwtError {
    Jwt(jsonwebtoken::errors::Error),
    EmptyClaim(&'static str),
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Jwt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AccessJwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

/// Access token (JWT) claims.
///
/// `scope` is the OAuth2 space-separated scope string. `aud` is checked by
/// jsonwebtoken against the raw claims when an audience is configured.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,

    #[serde(default)]
    pub sub: String,
    pub exp: u64,

    #[serde(default)]
    pub azp: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,
}

/// What the authorization gate works with once a token has been verified.
#[derive(Debug, Clone)]
pub struct VerifiedAccessToken {
    pub subject: String,
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub scopes: BTreeSet<String>,
}

impl VerifiedAccessToken {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

fn parse_scopes(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Access-token verifier for a single issuer key.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(
        public_key_pem: &str,
        algorithm: TokenAlgorithm,
        issuer: &str,
        audience: Option<&str>,
        leeway_seconds: u64,
    ) -> Result<Self, String> {
        let pem = public_key_pem.as_bytes();
        let (decoding_key, algorithm) = match algorithm {
            TokenAlgorithm::Rs256 => (DecodingKey::from_rsa_pem(pem), Algorithm::RS256),
            TokenAlgorithm::Es256 => (DecodingKey::from_ec_pem(pem), Algorithm::ES256),
            TokenAlgorithm::EdDsa => (DecodingKey::from_ed_pem(pem), Algorithm::EdDSA),
        };
        let decoding_key =
            decoding_key.map_err(|e| format!("invalid {:?} public key pem: {}", algorithm, e))?;

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[issuer]);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        validation.leeway = leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verify signature, `exp`, `iss` (and `aud` when configured), then
    /// require a non-empty subject.
    pub fn verify(&self, token: &str) -> Result<VerifiedAccessToken, AccessJwtError> {
        let claims =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?
                .claims;

        if claims.iss.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("iss"));
        }
        if claims.sub.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("sub"));
        }

        Ok(VerifiedAccessToken {
            scopes: parse_scopes(claims.scope.as_deref()),
            subject: claims.sub,
            client_id: claims.azp,
            username: claims.preferred_username,
        })
    }
}
