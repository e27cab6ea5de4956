use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use cucumber::World;
use log::*;
use proxy_order_engine::{
    db_types::{OrderCycle, ScheduleId, Subscription},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ConfirmedOrders,
    ProxyOrderSyncer,
    ScheduleApi,
    SqliteDatabase,
    SubscriptionApi,
    SyncResult,
};

#[derive(Default, Debug, World)]
pub struct ProxyOrderWorld {
    pub system: Option<ProxyOrderSystem>,
    pub order_cycles: HashMap<String, OrderCycle>,
    pub schedules: HashMap<String, ScheduleId>,
    pub subscriptions: HashMap<String, Subscription>,
    pub last_sync: Option<SyncResult>,
}

#[derive(Debug)]
pub struct ProxyOrderSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub schedules: ScheduleApi<SqliteDatabase, ConfirmedOrders>,
    pub subscriptions: SubscriptionApi<SqliteDatabase, ConfirmedOrders>,
}

impl ProxyOrderWorld {
    pub fn system(&self) -> &ProxyOrderSystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn subscription(&self, customer: &str) -> &Subscription {
        self.subscriptions.get(customer).unwrap_or_else(|| panic!("No subscription for {customer}"))
    }

    pub fn order_cycle(&self, name: &str) -> &OrderCycle {
        self.order_cycles.get(name).unwrap_or_else(|| panic!("No order cycle called {name}"))
    }

    pub fn last_sync(&self) -> &SyncResult {
        self.last_sync.as_ref().expect("No sync has run yet")
    }
}

impl ProxyOrderSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let syncer = ProxyOrderSyncer::new(db.clone(), ConfirmedOrders);
        Self {
            db_path: url,
            db,
            schedules: ScheduleApi::new(syncer.clone()),
            subscriptions: SubscriptionApi::new(syncer),
        }
    }
}

pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}
