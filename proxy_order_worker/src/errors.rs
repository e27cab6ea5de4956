use proxy_order_engine::{SqliteDatabaseError, SubscriptionApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Could not initialize the worker. {0}")]
    InitializeError(String),
    #[error("Database error. {0}")]
    DatabaseError(#[from] SqliteDatabaseError),
    #[error("Sync run failed. {0}")]
    SyncError(#[from] SubscriptionApiError),
    #[error("An I/O error happened in the worker. {0}")]
    IOError(#[from] std::io::Error),
}
