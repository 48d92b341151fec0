/*
 * Responsibility
 * - The user-store contract the handlers depend on
 * - Every operation is scoped by realm
 * - `create` writes the profile and the password credential in one call so a
 *   duplicate can only ever surface as `RepoError::Conflict`
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::repos::error::RepoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// A user about to be created. `username` and `email` are expected to be
/// normalized (trimmed, lower-cased) by the caller.
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub enabled: bool,
    /// PHC-formatted password hash.
    pub password_hash: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Search criteria for `UserStore::search`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    /// Lower-cased username fragment; `None` matches everyone.
    pub username: Option<String>,
    /// Match `username` exactly instead of as a substring.
    pub exact: bool,
    pub offset: i64,
    /// `None` returns every match.
    pub limit: Option<i64>,
}

impl UserQuery {
    pub fn matches(&self, username: &str) -> bool {
        match &self.username {
            None => true,
            Some(filter) if self.exact => username == filter,
            Some(filter) => username.contains(filter.as_str()),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    // Backend name, for logging.
    fn backend_name(&self) -> &'static str;

    async fn find_by_username(
        &self,
        realm: &str,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_email(&self, realm: &str, email: &str)
    -> Result<Option<UserRecord>, RepoError>;

    // Ordered by username.
    async fn search(&self, realm: &str, query: &UserQuery) -> Result<Vec<UserRecord>, RepoError>;

    async fn create(&self, realm: &str, user: NewUser) -> Result<UserRecord, RepoError>;
}
