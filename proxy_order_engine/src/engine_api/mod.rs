//! # Proxy order engine public API
//!
//! * [`proxy_order_syncer`] holds the core reconciliation loop, [`proxy_order_syncer::ProxyOrderSyncer`]. It brings
//!   the proxy orders of a set of subscriptions in line with their schedules in a bounded number of queries.
//! * [`reconcile`] is the pure diffing step the syncer uses for each subscription.
//! * [`schedule_api`] and [`subscription_api`] wrap the syncer for the lifecycle operations that should trigger a
//!   sync: editing order cycles, schedules and subscriptions.
//! * [`pinning`] defines how the order materialisation process tells the syncer which proxy orders to leave alone.
//!
//! # API usage
//!
//! Every API is built on a backend that implements the traits it needs, plus a pinned-order predicate.
//!
//! ```rust,ignore
//! use proxy_order_engine::{ConfirmedOrders, ProxyOrderSyncer, SqliteDatabase, SubscriptionApi};
//! let db = SqliteDatabase::new_with_url("sqlite://data/proxy_orders.db", 5).await?;
//! let api = SubscriptionApi::new(ProxyOrderSyncer::new(db, ConfirmedOrders));
//! let result = api.sync_all().await?;
//! println!("{}", result.summary());
//! ```

pub mod errors;
pub mod pinning;
pub mod proxy_order_syncer;
pub mod reconcile;
pub mod schedule_api;
pub mod subscription_api;
pub mod sync_objects;
