/*
 * Responsibility
 * - What the user store reports upward
 * - Unique violations become `Conflict` so the handler can answer 409
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[source] sqlx::Error),
    #[error("conflict")]
    Conflict,
    #[error("migration failed")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

// Postgres SQLSTATE unique_violation
const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(code: Option<&str>) -> bool {
    code == Some(UNIQUE_VIOLATION)
}

impl RepoError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && is_unique_violation(dbe.code().as_deref())
        {
            return RepoError::Conflict;
        }
        RepoError::Db(e)
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        Self::from_sqlx(e)
    }
}
