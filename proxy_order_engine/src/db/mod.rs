//! #  Database management and control.
//!
//! This module defines the contracts that database *backends* fulfil ([`traits`]) and ships the SQLite backend
//! ([`sqlite`]). You should rarely need to touch a backend directly. Use the public API in [`crate::engine_api`]
//! instead; the exceptions are the data types in [`crate::db_types`] and the materialisation hooks on
//! [`traits::ProxyOrderDatabase`].
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;
