use std::path::Path;

use log::*;
use proxy_order_engine::{ConfirmedOrders, ProxyOrderSyncer, SqliteDatabase, SubscriptionApi};

use crate::{
    config::WorkerConfig,
    errors::WorkerError,
    hooks::create_logging_event_handlers,
    sync_worker::{run_sync_once, start_sync_worker, WorkerApi},
};

/// Connects to the database, starts the event handlers and runs the sync loop until ctrl-c is received, or after a
/// single run if `run_once` is set.
pub async fn run_worker(config: WorkerConfig) -> Result<(), WorkerError> {
    let db = connect(&config).await?;
    let handlers = create_logging_event_handlers(config.event_buffer_size);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let syncer = ProxyOrderSyncer::new(db, ConfirmedOrders).with_options(config.sync_options()).with_producers(producers);
    let api: WorkerApi = SubscriptionApi::new(syncer);
    if config.dry_run {
        warn!("🕰️ Dry run mode. No proxy orders will be written.");
    }

    if config.run_once {
        run_sync_once(&api).await?;
        return Ok(());
    }
    let worker = start_sync_worker(api, config.sync_interval);
    let abort_handle = worker.abort_handle();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("🕰️ Shutdown requested");
            abort_handle.abort();
        },
        result = worker => {
            if let Err(e) = result {
                return Err(WorkerError::InitializeError(format!("The sync worker stopped unexpectedly. {e}")));
            }
        },
    }
    Ok(())
}

pub async fn connect(config: &WorkerConfig) -> Result<SqliteDatabase, WorkerError> {
    ensure_data_dir(&config.database_url)?;
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections).await?;
    if config.run_migrations {
        db.run_migrations().await?;
    } else {
        debug!("🕰️ Skipping database migrations");
    }
    Ok(db)
}

/// SQLite creates the database file on demand, but not the directory it lives in.
fn ensure_data_dir(url: &str) -> Result<(), WorkerError> {
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            info!("🕰️ Creating data directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use proxy_order_engine::{
        db_types::{NewOrderCycle, NewSchedule, NewSubscription, ProxyOrderState},
        test_utils::prepare_env::{drop_database, random_db_path},
        ScheduleManagement,
        SubscriptionManagement,
    };

    use super::*;

    #[tokio::test]
    async fn run_once_syncs_every_subscription() {
        let url = random_db_path();
        let config = WorkerConfig { database_url: url.clone(), max_connections: 1, run_once: true, ..Default::default() };
        let db = connect(&config).await.expect("Error connecting to database");
        let open = chrono::Utc::now() + chrono::Duration::days(1);
        let oc = db
            .insert_order_cycle(NewOrderCycle::new("Tomorrow", open, open + chrono::Duration::days(1)))
            .await
            .unwrap();
        let schedule = db.insert_schedule(NewSchedule::new("Daily").with_order_cycles(&[oc.id])).await.unwrap();
        let sub = db.insert_subscription(NewSubscription::new("alice", schedule.id)).await.unwrap();

        run_worker(config).await.expect("Worker run failed");
        assert_eq!(db.count_proxy_orders(sub.id, Some(ProxyOrderState::Active)).await.unwrap(), 1);
        db.pool().close().await;
        drop_database(&url).await;
    }
}
