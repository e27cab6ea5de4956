//! # SQLite backend
//!
//! The query modules in here are simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open a transaction and pass
//! `&mut tx` when several statements must be atomic. [`SqliteDatabase`] wires them up behind the backend traits.
mod db;
mod errors;

pub mod order_cycles;
pub mod proxy_orders;
pub mod schedules;
pub mod subscriptions;

use std::{env, str::FromStr};

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/proxy_orders.db";

/// The most ids bound into a single `IN (...)` or `VALUES` list. SQLite refuses statements with more than 32766
/// variables, so longer lists are split into several statements.
pub(crate) const MAX_IDS_PER_QUERY: usize = 5_000;

pub fn db_url() -> String {
    let result = env::var("OFN_DATABASE_URL").unwrap_or_else(|_| {
        info!("OFN_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// Opens a connection pool, creating the database file if it does not exist yet. Foreign keys are enforced.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
