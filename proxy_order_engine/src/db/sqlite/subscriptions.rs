use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::sqlite::{SqliteDatabaseError, MAX_IDS_PER_QUERY},
    db_types::{
        NewSubscription,
        ProxyOrderState,
        ScheduleId,
        Subscription,
        SubscriptionId,
        SubscriptionStatus,
        SubscriptionUpdate,
    },
};

const SUBSCRIPTION_COLUMNS: &str =
    "id, customer_id, shop_id, schedule_id, begins_at, ends_at, status, created_at, updated_at";

pub async fn insert_subscription(
    subscription: NewSubscription,
    conn: &mut SqliteConnection,
) -> Result<Subscription, SqliteDatabaseError> {
    let now = Utc::now();
    let sql = format!(
        r#"
            INSERT INTO subscriptions (customer_id, shop_id, schedule_id, begins_at, ends_at, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {SUBSCRIPTION_COLUMNS};
        "#
    );
    let record = sqlx::query_as::<_, Subscription>(&sql)
        .bind(subscription.customer_id)
        .bind(subscription.shop_id)
        .bind(subscription.schedule_id)
        .bind(subscription.begins_at)
        .bind(subscription.ends_at)
        .bind(SubscriptionStatus::Active)
        .bind(now)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Subscription {} for customer '{}' saved", record.id, record.customer_id);
    Ok(record)
}

pub async fn fetch_subscription(
    id: SubscriptionId,
    conn: &mut SqliteConnection,
) -> Result<Option<Subscription>, SqliteDatabaseError> {
    let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1");
    let subscription = sqlx::query_as::<_, Subscription>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(subscription)
}

/// Every subscription that is not cancelled, plus cancelled subscriptions that still hold active proxy orders,
/// ordered by id. The latter happens when a sync fails after the status change was committed.
pub async fn fetch_syncable_subscriptions(conn: &mut SqliteConnection) -> Result<Vec<Subscription>, SqliteDatabaseError> {
    let sql = format!(
        r#"
            SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions s
            WHERE s.status <> $1
               OR EXISTS (SELECT 1 FROM proxy_orders p WHERE p.subscription_id = s.id AND p.state = $2)
            ORDER BY s.id
        "#
    );
    let subscriptions = sqlx::query_as::<_, Subscription>(&sql)
        .bind(SubscriptionStatus::Cancelled)
        .bind(ProxyOrderState::Active)
        .fetch_all(conn)
        .await?;
    Ok(subscriptions)
}

pub async fn fetch_subscriptions_for_schedules(
    ids: &[ScheduleId],
    conn: &mut SqliteConnection,
) -> Result<Vec<Subscription>, SqliteDatabaseError> {
    let mut subscriptions = Vec::new();
    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE schedule_id IN ("
        ));
        let mut list = builder.separated(", ");
        for id in chunk {
            list.push_bind(*id);
        }
        list.push_unseparated(")");
        subscriptions.extend(builder.build_query_as::<Subscription>().fetch_all(&mut *conn).await?);
    }
    subscriptions.sort_by_key(|s| s.id);
    Ok(subscriptions)
}

pub async fn update_subscription(
    id: SubscriptionId,
    update: SubscriptionUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Subscription>, SqliteDatabaseError> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for subscription {id}. Update request skipped.");
        return fetch_subscription(id, conn).await;
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE subscriptions SET ");
    let mut set_clause = builder.separated(", ");
    set_clause.push("updated_at = ");
    set_clause.push_bind_unseparated(Utc::now());
    if let Some(schedule_id) = update.schedule_id {
        set_clause.push("schedule_id = ");
        set_clause.push_bind_unseparated(schedule_id);
    }
    if let Some(begins_at) = update.begins_at {
        set_clause.push("begins_at = ");
        set_clause.push_bind_unseparated(begins_at);
    }
    if let Some(ends_at) = update.ends_at {
        set_clause.push("ends_at = ");
        set_clause.push_bind_unseparated(ends_at);
    }
    if let Some(customer_id) = update.customer_id {
        set_clause.push("customer_id = ");
        set_clause.push_bind_unseparated(customer_id);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(format!(" RETURNING {SUBSCRIPTION_COLUMNS}"));
    trace!("🗃️ Executing query: {}", builder.sql());
    let subscription = builder.build_query_as::<Subscription>().fetch_optional(conn).await?;
    Ok(subscription)
}

pub async fn update_status(
    id: SubscriptionId,
    status: SubscriptionStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Subscription>, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE subscriptions SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {SUBSCRIPTION_COLUMNS}"
    );
    let subscription = sqlx::query_as::<_, Subscription>(&sql)
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(subscription)
}
