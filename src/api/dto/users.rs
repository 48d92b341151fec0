/*
 * Responsibility
 * - Request / response shapes for /addUser and /getUsers
 * - Input normalization (trim, lower-case username and email)
 * - The response type has no password field at all
 */
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_PAGE_SIZE, USERNAME_PASSWORD_REQUIRED};
use crate::repos::{UserQuery, UserRecord};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub enabled: Option<bool>,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the password
        f.debug_struct("CreateUserRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if non_blank(self.username.as_deref()).is_none() {
            return Err(USERNAME_PASSWORD_REQUIRED);
        }
        // Only an absent or empty password is rejected; surrounding spaces are kept.
        if self.password.as_deref().is_none_or(str::is_empty) {
            return Err(USERNAME_PASSWORD_REQUIRED);
        }
        Ok(())
    }

    pub fn normalized_username(&self) -> Option<String> {
        non_blank(self.username.as_deref()).map(str::to_lowercase)
    }

    pub fn normalized_email(&self) -> Option<String> {
        non_blank(self.email.as_deref()).map(str::to_lowercase)
    }

    pub fn first_name(&self) -> Option<String> {
        non_blank(self.first_name.as_deref()).map(str::to_string)
    }

    pub fn last_name(&self) -> Option<String> {
        non_blank(self.last_name.as_deref()).map(str::to_string)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ListUsersQuery {
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    pub exact: Option<bool>,
    pub first: Option<i64>,
    pub max: Option<i64>,
}

impl ListUsersQuery {
    pub fn to_user_query(&self) -> Result<UserQuery, &'static str> {
        let offset = self.first.unwrap_or(0);
        if offset < 0 {
            return Err("first must not be negative");
        }
        if self.max.is_some_and(|max| max < 1) {
            return Err("max must be at least 1");
        }

        Ok(UserQuery {
            username: non_blank(self.user_name.as_deref()).map(str::to_lowercase),
            exact: self.exact.unwrap_or(false),
            offset,
            limit: self.max.map(|max| max.min(MAX_PAGE_SIZE)),
        })
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub enabled: bool,
}

impl From<UserRecord> for UserRepresentation {
    fn from(user: UserRecord) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            enabled: user.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: Option<&str>, password: Option<&str>) -> CreateUserRequest {
        CreateUserRequest {
            username: username.map(str::to_string),
            password: password.map(str::to_string),
            ..CreateUserRequest::default()
        }
    }

    #[test]
    fn requires_username_and_password() {
        assert!(request(Some("alice"), Some("pw1")).validate().is_ok());
        assert_eq!(
            request(None, Some("pw1")).validate(),
            Err(USERNAME_PASSWORD_REQUIRED)
        );
        assert_eq!(
            request(Some("  "), Some("pw1")).validate(),
            Err(USERNAME_PASSWORD_REQUIRED)
        );
        assert_eq!(request(Some("alice"), None).validate(), Err(USERNAME_PASSWORD_REQUIRED));
        assert_eq!(
            request(Some("alice"), Some("")).validate(),
            Err(USERNAME_PASSWORD_REQUIRED)
        );
    }

    #[test]
    fn normalizes_identity_fields() {
        let req = CreateUserRequest {
            username: Some(" Alice ".to_string()),
            email: Some("Alice@Example.COM".to_string()),
            first_name: Some(" ".to_string()),
            ..CreateUserRequest::default()
        };

        assert_eq!(req.normalized_username().as_deref(), Some("alice"));
        assert_eq!(req.normalized_email().as_deref(), Some("alice@example.com"));
        assert_eq!(req.first_name(), None);
    }

    #[test]
    fn debug_omits_password() {
        let req = request(Some("alice"), Some("hunter2"));
        assert!(!format!("{req:?}").contains("hunter2"));
    }

    #[test]
    fn list_query_defaults_and_caps() {
        let query = ListUsersQuery::default().to_user_query().unwrap();
        assert_eq!(query.username, None);
        assert_eq!(query.limit, None);

        let query = ListUsersQuery {
            user_name: Some("Bob".to_string()),
            max: Some(50_000),
            ..ListUsersQuery::default()
        }
        .to_user_query()
        .unwrap();
        assert_eq!(query.username.as_deref(), Some("bob"));
        assert_eq!(query.limit, Some(MAX_PAGE_SIZE));

        let negative = ListUsersQuery {
            first: Some(-1),
            ..ListUsersQuery::default()
        };
        assert!(negative.to_user_query().is_err());
    }

    #[test]
    fn list_query_rejects_empty_pages() {
        for max in [0, -5] {
            let query = ListUsersQuery {
                max: Some(max),
                ..ListUsersQuery::default()
            };
            assert_eq!(query.to_user_query(), Err("max must be at least 1"));
        }

        let one = ListUsersQuery {
            max: Some(1),
            ..ListUsersQuery::default()
        };
        assert_eq!(one.to_user_query().unwrap().limit, Some(1));
    }

    #[test]
    fn representation_uses_camel_case() {
        let rep = UserRepresentation {
            username: "alice".to_string(),
            email: None,
            first_name: Some("Alice".to_string()),
            last_name: None,
            enabled: true,
        };
        let json = serde_json::to_value(&rep).unwrap();

        assert_eq!(json["firstName"], "Alice");
        assert!(json.get("password").is_none());
    }
}
