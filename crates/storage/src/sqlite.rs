//! SQLite-backed credential store.
//!
//! Enabled with the `sqlite` feature. Email uniqueness is delegated to a
//! `UNIQUE` constraint, so concurrent registrations of the same email are
//! serialized by the database, not by this process.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id        INTEGER PRIMARY KEY AUTOINCREMENT,
//!     email     TEXT    NOT NULL UNIQUE,
//!     pass_hash BLOB    NOT NULL,
//!     is_admin  BOOLEAN NOT NULL DEFAULT FALSE
//! );
//! CREATE TABLE apps (
//!     id     INTEGER PRIMARY KEY,
//!     name   TEXT NOT NULL UNIQUE,
//!     secret BLOB NOT NULL
//! );
//! ```

use async_trait::async_trait;
use sqlx::{
    FromRow, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    error::{StorageError, StorageResult},
    records::{Application, User},
    store::{AppProvider, UserProvider, UserSaver, app_key, user_id_key, user_key},
    types::{AppId, UserId},
};

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    email     TEXT    NOT NULL UNIQUE,
    pass_hash BLOB    NOT NULL,
    is_admin  BOOLEAN NOT NULL DEFAULT FALSE
)";

const CREATE_APPS: &str = "CREATE TABLE IF NOT EXISTS apps (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL UNIQUE,
    secret BLOB NOT NULL
)";

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    pass_hash: Vec<u8>,
}

#[derive(FromRow)]
struct AppRow {
    id: i64,
    name: String,
    secret: Vec<u8>,
}

/// Credential store persisted in SQLite.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database at `url`, e.g.
    /// `sqlite://storage/sso.db` or `sqlite::memory:`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the database cannot be opened.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let options: SqliteConnectOptions = url
            .parse::<SqliteConnectOptions>()
            .map_err(|e| StorageError::connection_with_source("invalid sqlite url", e))?
            .create_if_missing(true);

        // A single connection keeps `sqlite::memory:` databases coherent.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::connection_with_source("failed to open sqlite", e))?;

        Ok(Self { pool })
    }

    /// Creates the `users` and `apps` tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a DDL statement fails.
    pub async fn migrate(&self) -> StorageResult<()> {
        for ddl in [CREATE_USERS, CREATE_APPS] {
            sqlx::query(ddl).execute(&self.pool).await.map_err(|e| map_sqlx("migrate", e))?;
        }
        Ok(())
    }

    /// Seeds an application, replacing any existing row with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn insert_application(&self, app: &Application) -> StorageResult<()> {
        sqlx::query("INSERT OR REPLACE INTO apps (id, name, secret) VALUES (?, ?, ?)")
            .bind(app.id.0)
            .bind(&app.name)
            .bind(app.secret.as_slice())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx(&app_key(app.id), e))?;
        Ok(())
    }

    /// Grants or withdraws admin privilege.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the user does not exist.
    pub async fn set_admin(&self, user_id: UserId, is_admin: bool) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
            .bind(is_admin)
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx(&user_id_key(user_id), e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(user_id_key(user_id)));
        }
        Ok(())
    }
}

/// Maps a sqlx error onto the storage taxonomy.
fn map_sqlx(key: &str, err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::RowNotFound => StorageError::not_found(key),
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StorageError::already_exists(key)
        },
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StorageError::serialization_with_source(format!("failed to decode {key}"), err)
        },
        sqlx::Error::PoolTimedOut => StorageError::timeout(),
        sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
            StorageError::connection_with_source(format!("sqlite unavailable for {key}"), err)
        },
        other => StorageError::internal_with_source(format!("sqlite error for {key}"), other),
    }
}

#[async_trait]
impl UserSaver for SqliteCredentialStore {
    #[tracing::instrument(skip(self, pass_hash))]
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StorageResult<UserId> {
        let result = sqlx::query("INSERT INTO users (email, pass_hash) VALUES (?, ?)")
            .bind(email)
            .bind(pass_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx(&user_key(email), e))?;

        Ok(UserId::from(result.last_insert_rowid()))
    }
}

#[async_trait]
impl UserProvider for SqliteCredentialStore {
    #[tracing::instrument(skip(self))]
    async fn get_user(&self, email: &str) -> StorageResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, pass_hash FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx(&user_key(email), e))?;

        Ok(User::new(UserId::from(row.id), row.email, row.pass_hash))
    }

    #[tracing::instrument(skip(self))]
    async fn is_admin(&self, user_id: UserId) -> StorageResult<bool> {
        let (is_admin,): (bool,) = sqlx::query_as("SELECT is_admin FROM users WHERE id = ?")
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx(&user_id_key(user_id), e))?;

        Ok(is_admin)
    }
}

#[async_trait]
impl AppProvider for SqliteCredentialStore {
    #[tracing::instrument(skip(self))]
    async fn get_application(&self, app_id: AppId) -> StorageResult<Application> {
        let row = sqlx::query_as::<_, AppRow>("SELECT id, name, secret FROM apps WHERE id = ?")
            .bind(app_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx(&app_key(app_id), e))?;

        Ok(Application::new(AppId::from(row.id), row.name, row.secret))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::assert_storage_error;

    async fn memory_store() -> SqliteCredentialStore {
        let store = SqliteCredentialStore::connect("sqlite::memory:").await.expect("connect");
        store.migrate().await.expect("migrate");
        store
    }

    #[tokio::test]
    async fn test_save_and_get_user() {
        let store = memory_store().await;

        let id = store.save_user("alice@example.com", b"hash").await.expect("save");
        let user = store.get_user("alice@example.com").await.expect("get");

        assert_eq!(user.id, id);
        assert_eq!(user.pass_hash.as_slice(), b"hash");
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_already_exists() {
        let store = memory_store().await;
        store.save_user("dup@example.com", b"h1").await.expect("first");

        let result = store.save_user("dup@example.com", b"h2").await;

        assert_storage_error!(result, AlreadyExists);
    }

    #[tokio::test]
    async fn test_missing_rows_map_to_not_found() {
        let store = memory_store().await;

        assert_storage_error!(store.get_user("ghost@example.com").await, NotFound);
        assert_storage_error!(store.is_admin(UserId::from(77)).await, NotFound);
        assert_storage_error!(store.get_application(AppId::from(9)).await, NotFound);
        assert_storage_error!(store.set_admin(UserId::from(77), true).await, NotFound);
    }

    #[tokio::test]
    async fn test_admin_flag_and_applications() {
        let store = memory_store().await;
        let id = store.save_user("root@example.com", b"h").await.expect("save");
        store
            .insert_application(&Application::new(AppId::from(4), "ops", b"k".to_vec()))
            .await
            .expect("seed app");

        assert!(!store.is_admin(id).await.expect("default flag"));
        store.set_admin(id, true).await.expect("grant");
        assert!(store.is_admin(id).await.expect("granted flag"));

        let app = store.get_application(AppId::from(4)).await.expect("get app");
        assert_eq!(app.name, "ops");
        assert_eq!(app.secret.as_slice(), b"k");
    }
}
