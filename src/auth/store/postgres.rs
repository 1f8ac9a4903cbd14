//! PostgreSQL credential store.
//!
//! Schema: `sql/schema.sql`. Email uniqueness is enforced by a unique index,
//! so concurrent registrations race on the index instead of a lock. Every
//! query runs under the configured deadline and surfaces `Timeout` when it
//! is exceeded.

use crate::auth::{
    error::{StoreError, StoreResult},
    models::{App, User},
    store::CredentialStore,
};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};
use std::{future::Future, time::Duration};
use tracing::{info_span, Instrument};

pub const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    /// Connect a pool and make sure the schema exists.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached or the schema fails to apply.
    pub async fn connect(dsn: &str, timeout: Duration) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .acquire_timeout(timeout)
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .map_err(|e| map_sqlx_error("failed to connect to database", e))?;

        let store = Self::from_pool(pool, timeout);
        store.migrate().await?;

        Ok(store)
    }

    #[must_use]
    pub fn from_pool(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            self.deadline(sqlx::query(statement).execute(&self.pool))
                .await?
                .map_err(|e| map_sqlx_error("failed to apply schema", e))?;
        }

        Ok(())
    }

    /// Run `fut` under the store deadline.
    async fn deadline<F, T>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn map_sqlx_error(context: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        err if is_unique_violation(&err) => StoreError::Conflict,
        err => StoreError::internal_with_source(context, err),
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("pass_hash")?,
    })
}

fn app_from_row(row: &PgRow) -> Result<App, sqlx::Error> {
    Ok(App::new(
        row.try_get::<i32, _>("id")?,
        row.try_get::<String, _>("name")?,
        row.try_get::<String, _>("secret")?,
    ))
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<i64> {
        let query = "INSERT INTO users (email, pass_hash) VALUES ($1, $2) RETURNING id";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = self
            .deadline(
                sqlx::query(query)
                    .bind(email)
                    .bind(password_hash)
                    .fetch_one(&self.pool)
                    .instrument(span),
            )
            .await?
            .map_err(|e| map_sqlx_error("failed to insert user", e))?;

        row.try_get("id")
            .map_err(|e| map_sqlx_error("failed to read user id", e))
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<User> {
        let query = "SELECT id, email, pass_hash FROM users WHERE email = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = self
            .deadline(
                sqlx::query(query)
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .instrument(span),
            )
            .await?
            .map_err(|e| map_sqlx_error("failed to lookup user", e))?
            .ok_or(StoreError::NotFound)?;

        user_from_row(&row).map_err(|e| map_sqlx_error("failed to decode user", e))
    }

    async fn app_by_id(&self, app_id: i32) -> StoreResult<App> {
        let query = "SELECT id, name, secret FROM apps WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = self
            .deadline(
                sqlx::query(query)
                    .bind(app_id)
                    .fetch_optional(&self.pool)
                    .instrument(span),
            )
            .await?
            .map_err(|e| map_sqlx_error("failed to lookup app", e))?
            .ok_or(StoreError::NotFound)?;

        app_from_row(&row).map_err(|e| map_sqlx_error("failed to decode app", e))
    }

    async fn provision_app(&self, app: App) -> StoreResult<App> {
        let query = "INSERT INTO apps (id, name, secret) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        self.deadline(
            sqlx::query(query)
                .bind(app.id)
                .bind(&app.name)
                .bind(app.secret.expose_secret())
                .execute(&self.pool)
                .instrument(span),
        )
        .await?
        .map_err(|e| map_sqlx_error("failed to insert app", e))?;

        // the stored row wins if another writer got there first
        self.app_by_id(app.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{borrow::Cow, error::Error as StdError, fmt};

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));
        assert!(matches!(
            map_sqlx_error("insert", err),
            StoreError::Conflict
        ));
    }

    #[test]
    fn other_database_errors_are_internal() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));
        assert!(matches!(
            map_sqlx_error("insert", err),
            StoreError::Internal { .. }
        ));
    }

    #[test]
    fn pool_and_row_errors_map() {
        assert!(matches!(
            map_sqlx_error("select", sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
        assert!(matches!(
            map_sqlx_error("select", sqlx::Error::PoolTimedOut),
            StoreError::Timeout
        ));
    }

    #[test]
    fn row_decode_errors_are_internal() {
        let missing = sqlx::Error::ColumnNotFound("pass_hash".to_string());
        assert!(matches!(
            map_sqlx_error("decode", missing),
            StoreError::Internal { .. }
        ));

        let mismatched = sqlx::Error::ColumnDecode {
            index: "id".to_string(),
            source: "expected INT8".into(),
        };
        assert!(matches!(
            map_sqlx_error("decode", mismatched),
            StoreError::Internal { .. }
        ));
    }

    #[test]
    fn schema_declares_both_tables() {
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS apps"));
    }

    #[tokio::test]
    async fn deadline_surfaces_timeout() -> Result<(), sqlx::Error> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://sso@localhost:5432/sso")?;
        let store = PgStore::from_pool(pool, Duration::from_millis(10));

        let result = store
            .deadline(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert!(matches!(result, Err(StoreError::Timeout)));
        Ok(())
    }
}
