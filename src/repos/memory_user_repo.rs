/*
 * Responsibility
 * - Process-local user store (USER_STORE=memory, local runs and tests)
 * - Existence check and insert happen under one write lock
 */
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::repos::user_repo::{NewUser, UserQuery, UserRecord, UserStore};

struct StoredUser {
    record: UserRecord,
    password_hash: String,
}

/// Users keyed by `(realm, username)`, so iteration is already username-ordered
/// within a realm.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<(String, String), StoredUser>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored password hash for a user, if the user exists.
    pub async fn credential(&self, realm: &str, username: &str) -> Option<String> {
        self.users
            .read()
            .await
            .get(&(realm.to_string(), username.to_string()))
            .map(|u| u.password_hash.clone())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_username(
        &self,
        realm: &str,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .get(&(realm.to_string(), username.to_string()))
            .map(|u| u.record.clone()))
    }

    async fn find_by_email(
        &self,
        realm: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|((r, _), u)| r == realm && u.record.email.as_deref() == Some(email))
            .map(|(_, u)| u.record.clone()))
    }

    async fn search(&self, realm: &str, query: &UserQuery) -> Result<Vec<UserRecord>, RepoError> {
        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = query
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(0));

        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|((r, name), _)| r == realm && query.matches(name))
            .skip(offset)
            .take(limit)
            .map(|(_, u)| u.record.clone())
            .collect())
    }

    async fn create(&self, realm: &str, user: NewUser) -> Result<UserRecord, RepoError> {
        let mut users = self.users.write().await;

        let key = (realm.to_string(), user.username.clone());
        let email_taken = user.email.as_deref().is_some_and(|email| {
            users
                .iter()
                .any(|((r, _), u)| r == realm && u.record.email.as_deref() == Some(email))
        });
        if users.contains_key(&key) || email_taken {
            return Err(RepoError::Conflict);
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            enabled: user.enabled,
            created_at: Utc::now(),
        };
        users.insert(
            key,
            StoredUser {
                record: record.clone(),
                password_hash: user.password_hash,
            },
        );

        Ok(record)
    }
}
