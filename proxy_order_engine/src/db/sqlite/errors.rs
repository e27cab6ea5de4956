use thiserror::Error;

use crate::db_types::ProxyOrderId;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Proxy order not found: {0}")]
    ProxyOrderNotFound(ProxyOrderId),
}
