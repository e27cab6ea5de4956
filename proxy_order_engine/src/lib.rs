//! Proxy Order Engine
//!
//! Customers with a subscription get an order placed for them in every order cycle of their schedule. Ahead of each
//! cycle, the engine keeps a *proxy order* per (subscription, order cycle) pair: a placeholder that the order
//! materialisation process later turns into a real order. This library keeps that set of proxy orders in line with
//! the subscriptions and schedules as they change.
//!
//! The library is divided into three sections:
//! 1. Database management ([`mod@db`]). SQLite is the supported backend. The data types used in the database are
//!    defined in [`db_types`] and are public. Backends implement the traits re-exported at the crate root.
//! 2. The engine API ([`engine_api`]). [`ProxyOrderSyncer`] performs the reconciliation. [`ScheduleApi`] and
//!    [`SubscriptionApi`] handle the lifecycle operations that should trigger it.
//! 3. Events ([`events`]). Hooks are called for every proxy order that is created, reactivated or cancelled, and at
//!    the end of every sync run.
mod db;

pub mod db_types;
pub mod engine_api;
pub mod events;
pub mod time_window;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{
    AppliedChanges,
    InsertProxyOrderResult,
    ProxyOrderChanges,
    ProxyOrderDatabase,
    ScheduleManagement,
    SubscriptionManagement,
};
pub use engine_api::{
    errors::{ScheduleApiError, SubscriptionApiError, SyncError},
    pinning::{ConfirmedOrders, NeverPinned, PinnedOrders},
    proxy_order_syncer::ProxyOrderSyncer,
    schedule_api::ScheduleApi,
    subscription_api::SubscriptionApi,
    sync_objects::{SyncFailure, SyncOptions, SyncResult, SyncSummary, Synced},
};
pub use time_window::TimeWindow;
