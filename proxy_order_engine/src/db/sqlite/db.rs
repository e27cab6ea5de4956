use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{db_url, new_pool, order_cycles, proxy_orders, schedules, subscriptions, SqliteDatabaseError};
use crate::{
    db::traits::{
        AppliedChanges,
        InsertProxyOrderResult,
        ProxyOrderChanges,
        ProxyOrderDatabase,
        ScheduleManagement,
        SubscriptionManagement,
    },
    db_types::{
        NewOrderCycle,
        NewSchedule,
        NewSubscription,
        OrderCycle,
        OrderCycleId,
        ProxyOrder,
        ProxyOrderId,
        ProxyOrderState,
        Schedule,
        ScheduleId,
        Subscription,
        SubscriptionId,
        SubscriptionStatus,
        SubscriptionUpdate,
    },
};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `OFN_DATABASE_URL`.
    pub async fn new() -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete for {}", self.url);
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The total number of proxy order rows, in any state, for the subscription.
    pub async fn count_proxy_orders(
        &self,
        subscription_id: SubscriptionId,
        state: Option<ProxyOrderState>,
    ) -> Result<i64, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let count = match state {
            Some(state) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM proxy_orders WHERE subscription_id = $1 AND state = $2",
                )
                .bind(subscription_id)
                .bind(state)
                .fetch_one(&mut *conn)
                .await?
            },
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM proxy_orders WHERE subscription_id = $1")
                    .bind(subscription_id)
                    .fetch_one(&mut *conn)
                    .await?
            },
        };
        Ok(count)
    }

    /// Fetches the proxy order for the given (subscription, order cycle) pair, if there is one.
    pub async fn proxy_order_for(
        &self,
        subscription_id: SubscriptionId,
        order_cycle_id: OrderCycleId,
    ) -> Result<Option<ProxyOrder>, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        proxy_orders::fetch_by_pair(subscription_id, order_cycle_id, &mut conn).await
    }
}

impl ProxyOrderDatabase for SqliteDatabase {
    type Error = SqliteDatabaseError;

    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_schedules(&self, ids: &[ScheduleId]) -> Result<Vec<Schedule>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        schedules::fetch_schedules(ids, &mut conn).await
    }

    async fn fetch_proxy_orders_for_subscriptions(
        &self,
        ids: &[SubscriptionId],
    ) -> Result<Vec<ProxyOrder>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        proxy_orders::fetch_for_subscriptions(ids, &mut conn).await
    }

    async fn apply_proxy_order_changes(&self, changes: ProxyOrderChanges) -> Result<AppliedChanges, Self::Error> {
        let mut applied = AppliedChanges::default();
        if changes.is_empty() {
            return Ok(applied);
        }
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for new_proxy_order in changes.create {
            match proxy_orders::idempotent_insert(new_proxy_order, now, &mut tx).await? {
                InsertProxyOrderResult::Inserted(row) => applied.created.push(row),
                InsertProxyOrderResult::AlreadyExists(row) => applied.conflicts.push(row),
            }
        }
        applied.reactivated =
            proxy_orders::update_states(&changes.reactivate, ProxyOrderState::Active, now, &mut tx).await?;
        applied.cancelled =
            proxy_orders::update_states(&changes.cancel, ProxyOrderState::Cancelled, now, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Proxy order changes committed. {} created, {} conflicts, {} reactivated, {} cancelled",
            applied.created.len(),
            applied.conflicts.len(),
            applied.reactivated.len(),
            applied.cancelled.len()
        );
        Ok(applied)
    }

    async fn fetch_proxy_order(&self, id: ProxyOrderId) -> Result<Option<ProxyOrder>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        proxy_orders::fetch_proxy_order(id, &mut conn).await
    }

    async fn record_materialized_order(&self, id: ProxyOrderId, order_ref: &str) -> Result<ProxyOrder, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let proxy_order = proxy_orders::set_materialized_order(id, order_ref, &mut conn)
            .await?
            .ok_or(SqliteDatabaseError::ProxyOrderNotFound(id))?;
        debug!("🗃️ Proxy order {id} is now linked to order {order_ref}");
        Ok(proxy_order)
    }

    async fn mark_order_confirmed(&self, id: ProxyOrderId) -> Result<ProxyOrder, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let proxy_order =
            proxy_orders::set_confirmed(id, &mut conn).await?.ok_or(SqliteDatabaseError::ProxyOrderNotFound(id))?;
        debug!("🗃️ The order for proxy order {id} has been confirmed");
        Ok(proxy_order)
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl ScheduleManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_order_cycle(&self, order_cycle: NewOrderCycle) -> Result<OrderCycle, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        order_cycles::insert_order_cycle(order_cycle, &mut conn).await
    }

    async fn fetch_order_cycle(&self, id: OrderCycleId) -> Result<Option<OrderCycle>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        order_cycles::fetch_order_cycle(id, &mut conn).await
    }

    async fn update_order_cycle_window(
        &self,
        id: OrderCycleId,
        open: DateTime<Utc>,
        close: DateTime<Utc>,
    ) -> Result<Option<OrderCycle>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        order_cycles::update_window(id, open, close, &mut conn).await
    }

    async fn insert_schedule(&self, schedule: NewSchedule) -> Result<Schedule, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let created = schedules::insert_schedule(&schedule.name, &mut tx).await?;
        schedules::link_order_cycles(created.id, &schedule.order_cycle_ids, &mut tx).await?;
        let mut fetched = schedules::fetch_schedules(&[created.id], &mut tx).await?;
        tx.commit().await?;
        fetched.pop().ok_or_else(|| {
            SqliteDatabaseError::QueryError(format!("Schedule {} vanished straight after it was created", created.id))
        })
    }

    async fn fetch_schedule(&self, id: ScheduleId) -> Result<Option<Schedule>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let mut schedules = schedules::fetch_schedules(&[id], &mut conn).await?;
        Ok(schedules.pop())
    }

    async fn fetch_schedule_ids_for_order_cycle(&self, id: OrderCycleId) -> Result<Vec<ScheduleId>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        schedules::fetch_schedule_ids_for_order_cycle(id, &mut conn).await
    }

    async fn add_order_cycles_to_schedule(
        &self,
        id: ScheduleId,
        order_cycles: &[OrderCycleId],
    ) -> Result<u64, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let added = schedules::link_order_cycles(id, order_cycles, &mut tx).await?;
        tx.commit().await?;
        Ok(added)
    }

    async fn remove_order_cycles_from_schedule(
        &self,
        id: ScheduleId,
        order_cycles: &[OrderCycleId],
    ) -> Result<u64, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let removed = schedules::unlink_order_cycles(id, order_cycles, &mut tx).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn delete_schedule(&self, id: ScheduleId) -> Result<bool, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let deleted = schedules::delete_schedule(id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

impl SubscriptionManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_subscription(&self, subscription: NewSubscription) -> Result<Subscription, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        subscriptions::insert_subscription(subscription, &mut conn).await
    }

    async fn fetch_subscription(&self, id: SubscriptionId) -> Result<Option<Subscription>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        subscriptions::fetch_subscription(id, &mut conn).await
    }

    async fn fetch_syncable_subscriptions(&self) -> Result<Vec<Subscription>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        subscriptions::fetch_syncable_subscriptions(&mut conn).await
    }

    async fn fetch_subscriptions_for_schedules(&self, ids: &[ScheduleId]) -> Result<Vec<Subscription>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        subscriptions::fetch_subscriptions_for_schedules(ids, &mut conn).await
    }

    async fn update_subscription(
        &self,
        id: SubscriptionId,
        update: SubscriptionUpdate,
    ) -> Result<Option<Subscription>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        trace!("🗃️ Subscription {id} updating with new values: {update:?}");
        subscriptions::update_subscription(id, update, &mut conn).await
    }

    async fn update_subscription_status(
        &self,
        id: SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<Option<Subscription>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let subscription = subscriptions::update_status(id, status, &mut conn).await?;
        if subscription.is_some() {
            debug!("🗃️ Subscription {id} is now {status}");
        }
        Ok(subscription)
    }
}
