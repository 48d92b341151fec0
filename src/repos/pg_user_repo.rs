/*
 * Responsibility
 * - `realm_users` table access through SQLx
 * - Uniqueness of (realm, userName) and (realm, email) is enforced by the
 *   table itself, so a racing duplicate insert comes back as Conflict
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::repos::user_repo::{NewUser, UserQuery, UserRecord, UserStore};

#[derive(Debug, FromRow)]
struct UserRow {
    #[sqlx(rename = "userId")]
    id: Uuid,
    #[sqlx(rename = "userName")]
    user_name: String,
    email: Option<String>,
    #[sqlx(rename = "firstName")]
    first_name: Option<String>,
    #[sqlx(rename = "lastName")]
    last_name: Option<String>,
    enabled: bool,
    #[sqlx(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.user_name,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            enabled: row.enabled,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepoError> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&db).await?;

        Ok(Self::new(db))
    }
}

// `%`, `_` and the escape char itself are literal in a username filter.
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl UserStore for PgUserStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn find_by_username(
        &self,
        realm: &str,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT "userId", "userName", email, "firstName", "lastName", enabled, "createdAt"
            FROM realm_users
            WHERE realm = $1 AND "userName" = $2
            "#,
        )
        .bind(realm)
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_by_email(
        &self,
        realm: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT "userId", "userName", email, "firstName", "lastName", enabled, "createdAt"
            FROM realm_users
            WHERE realm = $1 AND email = $2
            "#,
        )
        .bind(realm)
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    async fn search(&self, realm: &str, query: &UserQuery) -> Result<Vec<UserRecord>, RepoError> {
        // $2: exact username, $3: LIKE pattern; at most one of them is set.
        // LIMIT NULL is no limit.
        let (exact, pattern) = match &query.username {
            Some(name) if query.exact => (Some(name.clone()), None),
            Some(name) => (None, Some(like_pattern(name))),
            None => (None, None),
        };

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT "userId", "userName", email, "firstName", "lastName", enabled, "createdAt"
            FROM realm_users
            WHERE realm = $1
              AND ($2::text IS NULL OR "userName" = $2)
              AND ($3::text IS NULL OR "userName" LIKE $3 ESCAPE '\')
            ORDER BY "userName"
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(realm)
        .bind(exact)
        .bind(pattern)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn create(&self, realm: &str, user: NewUser) -> Result<UserRecord, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO realm_users
                ("userId", realm, "userName", email, "firstName", "lastName", enabled, "passwordHash")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING "userId", "userName", email, "firstName", "lastName", enabled, "createdAt"
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(realm)
        .bind(&user.username)
        .bind(user.email.as_deref())
        .bind(user.first_name.as_deref())
        .bind(user.last_name.as_deref())
        .bind(user.enabled)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }
}
