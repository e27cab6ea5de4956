//! # Backend contracts
//!
//! The traits in this module define what a database backend must expose to be used by the proxy order engine.
//!
//! * [`ProxyOrderDatabase`] is what the syncer runs against: batched loads of schedules and proxy orders, and atomic
//!   application of a set of proxy order changes. It also carries the two hooks the order materialisation process
//!   uses to record progress on a proxy order.
//! * [`ScheduleManagement`] maintains order cycles and schedules.
//! * [`SubscriptionManagement`] maintains subscriptions.
mod data_objects;
mod proxy_order_database;
mod schedule_management;
mod subscription_management;

pub use data_objects::{AppliedChanges, InsertProxyOrderResult, ProxyOrderChanges};
pub use proxy_order_database::ProxyOrderDatabase;
pub use schedule_management::ScheduleManagement;
pub use subscription_management::SubscriptionManagement;
