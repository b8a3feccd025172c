use crate::error::DbError;
use configuration::DatabaseSettings;
use core_types::DbKind;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// A connection pool for one of the supported backends.
///
/// Cloning is cheap; every clone shares the same pool.
#[derive(Debug, Clone)]
pub enum Database {
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl Database {
    pub fn kind(&self) -> DbKind {
        match self {
            Database::MySql(_) => DbKind::MySql,
            Database::Sqlite(_) => DbKind::Sqlite,
        }
    }

    /// Closes the pool and waits for checked-out connections to be returned.
    pub async fn close(&self) {
        tracing::info!("Closing {} connection...", self.kind());
        match self {
            Database::MySql(pool) => pool.close().await,
            Database::Sqlite(pool) => pool.close().await,
        }
    }
}

/// Establishes a connection pool to the configured database.
///
/// The connect timeout is applied once here, as the pool acquire timeout;
/// individual queries carry no timeout of their own.
pub async fn connect(settings: &DatabaseSettings) -> Result<Database, DbError> {
    let timeout = Duration::from_secs(settings.connect_timeout_secs);

    let database = match settings.kind {
        DbKind::MySql => {
            let options = MySqlConnectOptions::new()
                .host(&settings.host)
                .port(settings.port)
                .username(&settings.user)
                .password(&settings.password)
                .database(&settings.name);
            let pool = MySqlPoolOptions::new()
                .max_connections(settings.max_connections)
                .acquire_timeout(timeout)
                .connect_with(options)
                .await?;
            Database::MySql(pool)
        }
        DbKind::Sqlite => {
            let options = SqliteConnectOptions::from_str(&settings.sqlite_url())
                .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?
                .create_if_missing(true);
            let pool = SqlitePoolOptions::new()
                .max_connections(settings.max_connections)
                .acquire_timeout(timeout)
                .connect_with(options)
                .await?;
            Database::Sqlite(pool)
        }
    };

    tracing::info!("Connected to {}!", database.kind());
    Ok(database)
}

/// Opens a private in-memory SQLite database.
///
/// The pool is pinned to a single connection, since every SQLite in-memory
/// connection sees its own empty database.
pub async fn connect_in_memory() -> Result<Database, DbError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(Database::Sqlite(pool))
}

/// Applies the versioned schema migrations for the connected backend.
pub async fn run_migrations(database: &Database) -> Result<(), DbError> {
    match database {
        Database::MySql(pool) => sqlx::migrate!("./migrations/mysql").run(pool).await?,
        Database::Sqlite(pool) => sqlx::migrate!("./migrations/sqlite").run(pool).await?,
    }
    tracing::info!("All migrations applied successfully!");
    Ok(())
}
