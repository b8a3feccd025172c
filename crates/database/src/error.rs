use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    /// Any transport or protocol failure reported by the driver, including
    /// SQL syntax errors; the two are not told apart.
    #[error("Database driver error: {0}")]
    ConnectivityError(#[source] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("The requested data was not found in the database.")]
    NotFound,

    #[error("Destination shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DbError::NotFound,
            other => DbError::ConnectivityError(other),
        }
    }
}
