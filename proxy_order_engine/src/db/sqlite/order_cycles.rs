use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewOrderCycle, OrderCycle, OrderCycleId},
};

pub(crate) const ORDER_CYCLE_COLUMNS: &str =
    "id, name, coordinator_id, orders_open_at, orders_close_at, created_at, updated_at";

/// Inserts a new order cycle. The window is stored as given; callers validate it beforehand.
pub async fn insert_order_cycle(
    order_cycle: NewOrderCycle,
    conn: &mut SqliteConnection,
) -> Result<OrderCycle, SqliteDatabaseError> {
    let now = Utc::now();
    let sql = format!(
        r#"
            INSERT INTO order_cycles (name, coordinator_id, orders_open_at, orders_close_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {ORDER_CYCLE_COLUMNS};
        "#
    );
    let record = sqlx::query_as::<_, OrderCycle>(&sql)
        .bind(order_cycle.name)
        .bind(order_cycle.coordinator_id)
        .bind(order_cycle.orders_open_at)
        .bind(order_cycle.orders_close_at)
        .bind(now)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Order cycle {} saved with window [{}, {})", record.id, record.orders_open_at, record.orders_close_at);
    Ok(record)
}

pub async fn fetch_order_cycle(
    id: OrderCycleId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderCycle>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_CYCLE_COLUMNS} FROM order_cycles WHERE id = $1");
    let order_cycle = sqlx::query_as::<_, OrderCycle>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(order_cycle)
}

pub async fn update_window(
    id: OrderCycleId,
    open: DateTime<Utc>,
    close: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderCycle>, SqliteDatabaseError> {
    let sql = format!(
        r#"
            UPDATE order_cycles SET orders_open_at = $1, orders_close_at = $2, updated_at = $3
            WHERE id = $4
            RETURNING {ORDER_CYCLE_COLUMNS};
        "#
    );
    let order_cycle = sqlx::query_as::<_, OrderCycle>(&sql)
        .bind(open)
        .bind(close)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(order_cycle)
}
