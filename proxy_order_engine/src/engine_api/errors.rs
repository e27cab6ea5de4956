use thiserror::Error;

use crate::db_types::{OrderCycleId, ScheduleId, SubscriptionId, SubscriptionStatus, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The subscription points at something that does not exist. Not retried; the subscription is skipped.
    #[error("Subscription {subscription} references {schedule}, which could not be found")]
    ConfigurationError { subscription: SubscriptionId, schedule: ScheduleId },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl SyncError {
    pub(crate) fn database<E: std::error::Error>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }

    /// Configuration errors only affect a single subscription. Anything else aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ConfigurationError { .. })
    }
}

#[derive(Debug, Clone, Error)]
pub enum ScheduleApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid schedule data. {0}")]
    ValidationError(#[from] ValidationError),
    #[error("Schedule {0} does not exist")]
    ScheduleNotFound(ScheduleId),
    #[error("Order cycle {0} does not exist")]
    OrderCycleNotFound(OrderCycleId),
    #[error("Schedule {0} cannot be deleted while {1} subscriptions use it")]
    ScheduleInUse(ScheduleId, usize),
    #[error("Could not synchronise proxy orders. {0}")]
    SyncError(#[from] SyncError),
}

impl ScheduleApiError {
    pub(crate) fn database<E: std::error::Error>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SubscriptionApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid subscription data. {0}")]
    ValidationError(#[from] ValidationError),
    #[error("Subscription {0} does not exist")]
    SubscriptionNotFound(SubscriptionId),
    #[error("Schedule {0} does not exist")]
    ScheduleNotFound(ScheduleId),
    #[error("Subscription {0} cannot change from {1} to {2}")]
    InvalidStatusChange(SubscriptionId, SubscriptionStatus, SubscriptionStatus),
    #[error("Could not synchronise proxy orders. {0}")]
    SyncError(#[from] SyncError),
}

impl SubscriptionApiError {
    pub(crate) fn database<E: std::error::Error>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
