use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::{
        sqlite::{SqliteDatabaseError, MAX_IDS_PER_QUERY},
        traits::InsertProxyOrderResult,
    },
    db_types::{NewProxyOrder, OrderCycleId, ProxyOrder, ProxyOrderId, ProxyOrderState, SubscriptionId},
};

const PROXY_ORDER_COLUMNS: &str = "id, subscription_id, order_cycle_id, state, order_ref, placed_at, confirmed_at, \
                                   cancelled_at, created_at, updated_at";

/// Fetches every proxy order for the given subscriptions, ordered by subscription and then id. Long id lists are
/// split into chunks of [`MAX_IDS_PER_QUERY`].
pub async fn fetch_for_subscriptions(
    ids: &[SubscriptionId],
    conn: &mut SqliteConnection,
) -> Result<Vec<ProxyOrder>, SqliteDatabaseError> {
    let mut proxy_orders = Vec::new();
    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PROXY_ORDER_COLUMNS} FROM proxy_orders WHERE subscription_id IN ("
        ));
        let mut list = builder.separated(", ");
        for id in chunk {
            list.push_bind(*id);
        }
        list.push_unseparated(")");
        let rows = builder.build_query_as::<ProxyOrder>().fetch_all(&mut *conn).await?;
        proxy_orders.extend(rows);
    }
    proxy_orders.sort_by_key(|p| (p.subscription_id, p.id));
    trace!("🗃️ {} proxy orders loaded for {} subscriptions", proxy_orders.len(), ids.len());
    Ok(proxy_orders)
}

pub async fn fetch_proxy_order(
    id: ProxyOrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<ProxyOrder>, SqliteDatabaseError> {
    let sql = format!("SELECT {PROXY_ORDER_COLUMNS} FROM proxy_orders WHERE id = $1");
    let proxy_order = sqlx::query_as::<_, ProxyOrder>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(proxy_order)
}

pub async fn fetch_by_pair(
    subscription_id: SubscriptionId,
    order_cycle_id: OrderCycleId,
    conn: &mut SqliteConnection,
) -> Result<Option<ProxyOrder>, SqliteDatabaseError> {
    let sql = format!("SELECT {PROXY_ORDER_COLUMNS} FROM proxy_orders WHERE subscription_id = $1 AND order_cycle_id = $2");
    let proxy_order =
        sqlx::query_as::<_, ProxyOrder>(&sql).bind(subscription_id).bind(order_cycle_id).fetch_optional(conn).await?;
    Ok(proxy_order)
}

/// Inserts a new, active proxy order. If the (subscription, order cycle) pair already has a proxy order, nothing is
/// written and the existing row is returned as [`InsertProxyOrderResult::AlreadyExists`].
///
/// This is not atomic on its own with respect to other statements. Embed it in a transaction if needed.
pub async fn idempotent_insert(
    proxy_order: NewProxyOrder,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<InsertProxyOrderResult, SqliteDatabaseError> {
    let sql = format!(
        r#"
            INSERT INTO proxy_orders (subscription_id, order_cycle_id, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (subscription_id, order_cycle_id) DO NOTHING
            RETURNING {PROXY_ORDER_COLUMNS};
        "#
    );
    let inserted = sqlx::query_as::<_, ProxyOrder>(&sql)
        .bind(proxy_order.subscription_id)
        .bind(proxy_order.order_cycle_id)
        .bind(ProxyOrderState::Active)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(row) = inserted {
        return Ok(InsertProxyOrderResult::Inserted(row));
    }
    let NewProxyOrder { subscription_id, order_cycle_id } = proxy_order;
    debug!("🗃️ A proxy order for {subscription_id} in {order_cycle_id} already exists");
    match fetch_by_pair(subscription_id, order_cycle_id, conn).await? {
        Some(existing) => Ok(InsertProxyOrderResult::AlreadyExists(existing)),
        None => Err(SqliteDatabaseError::QueryError(format!(
            "Proxy order insert for {subscription_id} in {order_cycle_id} was ignored, but no row exists"
        ))),
    }
}

/// Moves the given proxy orders into `state`. Rows that are already in that state are not touched. Returns the rows
/// that changed, as they are after the update.
///
/// Long id lists are split into chunks of [`MAX_IDS_PER_QUERY`]. Run this inside a transaction if the whole list
/// must be applied atomically.
pub async fn update_states(
    ids: &[ProxyOrderId],
    state: ProxyOrderState,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<ProxyOrder>, SqliteDatabaseError> {
    let cancelled_at = match state {
        ProxyOrderState::Active => None,
        ProxyOrderState::Cancelled => Some(now),
    };
    let mut updated = Vec::new();
    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE proxy_orders SET state = ");
        builder.push_bind(state);
        builder.push(", cancelled_at = ");
        builder.push_bind(cancelled_at);
        builder.push(", updated_at = ");
        builder.push_bind(now);
        builder.push(" WHERE state <> ");
        builder.push_bind(state);
        builder.push(" AND id IN (");
        let mut list = builder.separated(", ");
        for id in chunk {
            list.push_bind(*id);
        }
        list.push_unseparated(format!(") RETURNING {PROXY_ORDER_COLUMNS}"));
        let rows = builder.build_query_as::<ProxyOrder>().fetch_all(&mut *conn).await?;
        updated.extend(rows);
    }
    trace!("🗃️ {} of {} proxy orders moved to {state}", updated.len(), ids.len());
    Ok(updated)
}

pub async fn set_materialized_order(
    id: ProxyOrderId,
    order_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ProxyOrder>, SqliteDatabaseError> {
    let now = Utc::now();
    let sql = format!(
        r#"
            UPDATE proxy_orders SET order_ref = $1, placed_at = COALESCE(placed_at, $2), updated_at = $2
            WHERE id = $3
            RETURNING {PROXY_ORDER_COLUMNS};
        "#
    );
    let proxy_order =
        sqlx::query_as::<_, ProxyOrder>(&sql).bind(order_ref).bind(now).bind(id).fetch_optional(conn).await?;
    Ok(proxy_order)
}

pub async fn set_confirmed(
    id: ProxyOrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<ProxyOrder>, SqliteDatabaseError> {
    let now = Utc::now();
    let sql = format!(
        r#"
            UPDATE proxy_orders SET confirmed_at = COALESCE(confirmed_at, $1), updated_at = $1
            WHERE id = $2
            RETURNING {PROXY_ORDER_COLUMNS};
        "#
    );
    let proxy_order = sqlx::query_as::<_, ProxyOrder>(&sql).bind(now).bind(id).fetch_optional(conn).await?;
    Ok(proxy_order)
}
