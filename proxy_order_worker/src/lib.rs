//! # Proxy order worker
//!
//! A long-running process that periodically syncs the proxy orders of every subscription that has not been
//! cancelled. It is responsible for:
//! * Connecting to the database and bringing its schema up to date.
//! * Running [`proxy_order_engine::SubscriptionApi::sync_all`] on a fixed interval, or once if asked to.
//! * Logging every proxy order change and sync summary via the engine's event hooks.
//!
//! ## Configuration
//! The worker is configured via environment variables. See [config](config/index.html) for more information.
pub mod cli;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod sync_worker;
pub mod worker;
