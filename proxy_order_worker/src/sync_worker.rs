use std::time::Duration;

use chrono::Utc;
use log::*;
use proxy_order_engine::{ConfirmedOrders, SqliteDatabase, SubscriptionApi, SyncResult};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::errors::WorkerError;

pub type WorkerApi = SubscriptionApi<SqliteDatabase, ConfirmedOrders>;

/// Starts the sync worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The first run starts immediately. A failed run is logged and retried at the next tick; since every committed batch
/// stays committed, the next run only has the remainder to do.
pub fn start_sync_worker(api: WorkerApi, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🕰️ Proxy order sync worker started. Syncing every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            if let Err(e) = run_sync_once(&api).await {
                error!("🕰️ Error running proxy order sync job: {e}");
            }
        }
    })
}

pub async fn run_sync_once(api: &WorkerApi) -> Result<SyncResult, WorkerError> {
    info!("🕰️ Running proxy order sync job");
    let started = Utc::now();
    let result = api.sync_all().await?;
    let elapsed = Utc::now() - started;
    info!("🕰️ Sync job finished in {}ms. {} proxy orders written", elapsed.num_milliseconds(), result.total_writes());
    for failure in &result.failures {
        warn!("🕰️ {} was skipped. {}", failure.subscription_id, failure.error);
    }
    Ok(result)
}
