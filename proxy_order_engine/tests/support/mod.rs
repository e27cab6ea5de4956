#![allow(dead_code)]
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use log::*;
use proxy_order_engine::{
    db_types::{
        NewOrderCycle,
        NewSchedule,
        NewSubscription,
        OrderCycle,
        ProxyOrder,
        ProxyOrderId,
        Schedule,
        ScheduleId,
        Subscription,
        SubscriptionId,
    },
    test_utils::prepare_env::{drop_database, prepare_test_env, random_db_path},
    AppliedChanges,
    ProxyOrderChanges,
    ProxyOrderDatabase,
    ScheduleManagement,
    SqliteDatabase,
    SqliteDatabaseError,
    SubscriptionManagement,
};

/// Midnight on the given day, counting from an arbitrary fixed epoch.
pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

pub async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database")
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    drop_database(&url).await;
}

/// `n` back-to-back daily order cycles. Order cycle `i` trades on day `i`.
pub async fn daily_order_cycles(db: &SqliteDatabase, n: i64) -> Vec<OrderCycle> {
    let mut result = Vec::with_capacity(n as usize);
    for i in 0..n {
        let oc = NewOrderCycle::new(format!("Day {i}"), day(i), day(i + 1)).with_coordinator("hub");
        result.push(db.insert_order_cycle(oc).await.expect("Error creating order cycle"));
    }
    result
}

pub async fn schedule_of(db: &SqliteDatabase, order_cycles: &[OrderCycle]) -> Schedule {
    let ids = order_cycles.iter().map(|oc| oc.id).collect::<Vec<_>>();
    db.insert_schedule(NewSchedule::new("Daily veg box").with_order_cycles(&ids)).await.expect("Error creating schedule")
}

pub async fn open_ended_subscriptions(db: &SqliteDatabase, schedule_id: ScheduleId, n: usize) -> Vec<Subscription> {
    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let sub = NewSubscription::new(format!("customer-{i}"), schedule_id).with_shop("shop-1");
        result.push(db.insert_subscription(sub).await.expect("Error creating subscription"));
    }
    result
}

/// Wraps a real backend and counts how often each method of [`ProxyOrderDatabase`] is called.
#[derive(Clone)]
pub struct CountingDatabase {
    pub inner: SqliteDatabase,
    pub schedule_loads: Arc<AtomicUsize>,
    pub proxy_order_loads: Arc<AtomicUsize>,
    pub writes: Arc<AtomicUsize>,
}

impl CountingDatabase {
    pub fn new(inner: SqliteDatabase) -> Self {
        Self {
            inner,
            schedule_loads: Arc::default(),
            proxy_order_loads: Arc::default(),
            writes: Arc::default(),
        }
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.schedule_loads.load(Ordering::SeqCst),
            self.proxy_order_loads.load(Ordering::SeqCst),
            self.writes.load(Ordering::SeqCst),
        )
    }

    pub fn reset(&self) {
        self.schedule_loads.store(0, Ordering::SeqCst);
        self.proxy_order_loads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }
}

impl ProxyOrderDatabase for CountingDatabase {
    type Error = SqliteDatabaseError;

    fn url(&self) -> &str {
        self.inner.url()
    }

    async fn fetch_schedules(&self, ids: &[ScheduleId]) -> Result<Vec<Schedule>, Self::Error> {
        self.schedule_loads.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_schedules(ids).await
    }

    async fn fetch_proxy_orders_for_subscriptions(
        &self,
        ids: &[SubscriptionId],
    ) -> Result<Vec<ProxyOrder>, Self::Error> {
        self.proxy_order_loads.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_proxy_orders_for_subscriptions(ids).await
    }

    async fn apply_proxy_order_changes(&self, changes: ProxyOrderChanges) -> Result<AppliedChanges, Self::Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.apply_proxy_order_changes(changes).await
    }

    async fn fetch_proxy_order(&self, id: ProxyOrderId) -> Result<Option<ProxyOrder>, Self::Error> {
        self.inner.fetch_proxy_order(id).await
    }

    async fn record_materialized_order(&self, id: ProxyOrderId, order_ref: &str) -> Result<ProxyOrder, Self::Error> {
        self.inner.record_materialized_order(id, order_ref).await
    }

    async fn mark_order_confirmed(&self, id: ProxyOrderId) -> Result<ProxyOrder, Self::Error> {
        self.inner.mark_order_confirmed(id).await
    }
}
