use async_trait::async_trait;
use shortlink_core::error::StorageError;
use shortlink_core::repository::{Repository, Result, UrlRecord};
use shortlink_core::Alias;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

/// Schema migrations embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connection settings for a file-backed SQLite database.
#[derive(Debug, Clone, TypedBuilder)]
pub struct SqliteSettings {
    /// Path of the database file.
    #[builder(setter(into))]
    pub path: String,
    #[builder(default = 25)]
    pub max_connections: u32,
    #[builder(default = Duration::from_secs(5))]
    pub busy_timeout: Duration,
    #[builder(default = Duration::from_secs(5 * 60))]
    pub max_lifetime: Duration,
    #[builder(default = true)]
    pub create_if_missing: bool,
}

/// SQLite implementation of the repository contract.
///
/// Alias uniqueness is enforced by a `UNIQUE` constraint; a violation on
/// insert is reported as [`StorageError::Conflict`].
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a repository from an existing SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool on the configured database file.
    ///
    /// The database runs in WAL mode with `synchronous = NORMAL`, foreign
    /// keys enabled and a busy timeout so concurrent writers wait instead of
    /// failing immediately.
    pub async fn connect(settings: &SqliteSettings) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&settings.path)
            .create_if_missing(settings.create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(settings.busy_timeout)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .max_lifetime(settings.max_lifetime)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        info!(
            path = %settings.path,
            max_connections = settings.max_connections,
            "connected to sqlite"
        );

        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database.
    ///
    /// The pool holds a single connection that is never recycled, since every
    /// new connection to `sqlite::memory:` would see an empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(map_sqlx_error)?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        Ok(Self::new(pool))
    }

    /// Applies all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;
        debug!("sqlite migrations applied");
        Ok(())
    }

    /// Reverts every applied migration.
    pub async fn undo_migrations(&self) -> Result<()> {
        MIGRATOR
            .undo(&self.pool, 0)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;
        debug!("sqlite migrations reverted");
        Ok(())
    }

    /// Closes every connection in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

impl SqliteRepository {
    async fn fetch_column(&self, sql: &str, column: &str, alias: &Alias) -> Result<String> {
        let row = sqlx::query(sql)
            .bind(alias.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Err(StorageError::NotFound(alias.to_string()));
        };

        row.try_get(column).map_err(map_sqlx_error)
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn save_url(&self, record: UrlRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO urls (alias, url, owner_email)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(record.alias.as_str())
        .bind(&record.original_url)
        .bind(&record.owner_email)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(record.alias.into_inner()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn get_url(&self, alias: &Alias) -> Result<String> {
        self.fetch_column("SELECT url FROM urls WHERE alias = ? LIMIT 1", "url", alias)
            .await
    }

    async fn get_url_owner(&self, alias: &Alias) -> Result<String> {
        self.fetch_column(
            "SELECT owner_email FROM urls WHERE alias = ? LIMIT 1",
            "owner_email",
            alias,
        )
        .await
    }

    async fn delete_url(&self, alias: &Alias) -> Result<()> {
        let result = sqlx::query("DELETE FROM urls WHERE alias = ?")
            .bind(alias.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(alias.to_string()));
        }

        Ok(())
    }
}
