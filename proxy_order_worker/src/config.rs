use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use proxy_order_engine::{engine_api::sync_objects::DEFAULT_BATCH_SIZE, SyncOptions};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/proxy_orders.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(3600);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 128;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// If true, pending migrations are applied before the first sync.
    pub run_migrations: bool,
    /// The time between the start of consecutive sync runs.
    pub sync_interval: Duration,
    pub batch_size: usize,
    /// Compute and log the changes each run would make, without writing them.
    pub dry_run: bool,
    /// Run a single sync and exit, rather than looping forever. Handy for cron jobs.
    pub run_once: bool,
    pub event_buffer_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
            run_once: false,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl WorkerConfig {
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any key-value source. Missing or invalid values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let defaults = Self::default();
        let database_url = lookup("OFN_DATABASE_URL").unwrap_or_else(|| {
            info!("🪛️ OFN_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            defaults.database_url
        });
        let max_connections = parse_or_default(&lookup, "OFN_DB_MAX_CONNECTIONS", defaults.max_connections);
        let run_migrations = flag_or_default(&lookup, "OFN_RUN_MIGRATIONS", defaults.run_migrations);
        let sync_interval =
            Duration::from_secs(parse_or_default(&lookup, "OFN_SYNC_INTERVAL", defaults.sync_interval.as_secs()));
        let sync_interval = if sync_interval.is_zero() {
            warn!("🪛️ OFN_SYNC_INTERVAL cannot be zero. Using the default of {}s.", DEFAULT_SYNC_INTERVAL.as_secs());
            DEFAULT_SYNC_INTERVAL
        } else {
            sync_interval
        };
        let batch_size = match parse_or_default(&lookup, "OFN_SYNC_BATCH_SIZE", defaults.batch_size) {
            0 => {
                warn!("🪛️ OFN_SYNC_BATCH_SIZE cannot be zero. Using the default of {DEFAULT_BATCH_SIZE}.");
                DEFAULT_BATCH_SIZE
            },
            n => n,
        };
        let dry_run = flag_or_default(&lookup, "OFN_SYNC_DRY_RUN", defaults.dry_run);
        let run_once = flag_or_default(&lookup, "OFN_SYNC_ONCE", defaults.run_once);
        Self {
            database_url,
            max_connections,
            run_migrations,
            sync_interval,
            batch_size,
            dry_run,
            run_once,
            event_buffer_size: defaults.event_buffer_size,
        }
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions::default().with_batch_size(self.batch_size).with_dry_run(self.dry_run)
    }
}

fn parse_or_default<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(name) {
        None => default,
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {name}: {s}. {e}. Using the default, {default}, instead.");
            default
        }),
    }
}

fn flag_or_default<F>(lookup: &F, name: &str, default: bool) -> bool
where F: Fn(&str) -> Option<String> {
    match lookup(name).map(|s| s.trim().to_lowercase()) {
        None => default,
        Some(s) if s == "1" || s == "true" || s == "yes" => true,
        Some(s) if s == "0" || s == "false" || s == "no" => false,
        Some(s) => {
            warn!("🪛️ {name} should be true or false, but is {s}. Using the default, {default}, instead.");
            default
        },
    }
}
