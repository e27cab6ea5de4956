use std::collections::HashMap;

use chrono::Utc;
use log::{debug, trace};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::sqlite::{SqliteDatabaseError, MAX_IDS_PER_QUERY},
    db_types::{OrderCycle, OrderCycleId, Schedule, ScheduleId},
};

#[derive(Debug, FromRow)]
struct ScheduledOrderCycle {
    schedule_id: ScheduleId,
    #[sqlx(flatten)]
    order_cycle: OrderCycle,
}

pub async fn insert_schedule(name: &str, conn: &mut SqliteConnection) -> Result<Schedule, SqliteDatabaseError> {
    let now = Utc::now();
    let schedule = sqlx::query_as::<_, Schedule>(
        r#"
            INSERT INTO schedules (name, created_at, updated_at) VALUES ($1, $2, $2)
            RETURNING id, name, created_at, updated_at;
        "#,
    )
    .bind(name)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Schedule '{}' created as {}", schedule.name, schedule.id);
    Ok(schedule)
}

/// Links the order cycles to the schedule. Existing links are left alone. Returns the number of new links.
pub async fn link_order_cycles(
    schedule_id: ScheduleId,
    order_cycles: &[OrderCycleId],
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    if order_cycles.is_empty() {
        return Ok(0);
    }
    let mut linked = 0;
    // Two variables per row
    for chunk in order_cycles.chunks(MAX_IDS_PER_QUERY / 2) {
        let mut builder =
            QueryBuilder::<Sqlite>::new("INSERT OR IGNORE INTO schedule_order_cycles (schedule_id, order_cycle_id) ");
        builder.push_values(chunk, |mut row, oc_id| {
            row.push_bind(schedule_id).push_bind(*oc_id);
        });
        linked += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    touch_schedule(schedule_id, conn).await?;
    Ok(linked)
}

pub async fn unlink_order_cycles(
    schedule_id: ScheduleId,
    order_cycles: &[OrderCycleId],
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    if order_cycles.is_empty() {
        return Ok(0);
    }
    let mut unlinked = 0;
    for chunk in order_cycles.chunks(MAX_IDS_PER_QUERY) {
        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM schedule_order_cycles WHERE schedule_id = ");
        builder.push_bind(schedule_id);
        builder.push(" AND order_cycle_id IN (");
        push_id_list(&mut builder, chunk);
        unlinked += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    touch_schedule(schedule_id, conn).await?;
    Ok(unlinked)
}

async fn touch_schedule(schedule_id: ScheduleId, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE schedules SET updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(schedule_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Fetches the requested schedules along with their order cycles using two queries per [`MAX_IDS_PER_QUERY`] ids.
/// Schedules are sorted by id and their order cycles by opening time.
pub async fn fetch_schedules(
    ids: &[ScheduleId],
    conn: &mut SqliteConnection,
) -> Result<Vec<Schedule>, SqliteDatabaseError> {
    let mut schedules = Vec::new();
    let mut cycles_by_schedule: HashMap<ScheduleId, Vec<OrderCycle>> = HashMap::new();
    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT id, name, created_at, updated_at FROM schedules WHERE id IN (");
        push_id_list(&mut builder, chunk);
        schedules.extend(builder.build_query_as::<Schedule>().fetch_all(&mut *conn).await?);

        let mut builder = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT soc.schedule_id, oc.id, oc.name, oc.coordinator_id, oc.orders_open_at, oc.orders_close_at,
                   oc.created_at, oc.updated_at
            FROM schedule_order_cycles soc JOIN order_cycles oc ON oc.id = soc.order_cycle_id
            WHERE soc.schedule_id IN ("#,
        );
        push_id_list(&mut builder, chunk);
        trace!("🗃️ Executing query: {}", builder.sql());
        let rows = builder.build_query_as::<ScheduledOrderCycle>().fetch_all(&mut *conn).await?;
        for row in rows {
            cycles_by_schedule.entry(row.schedule_id).or_default().push(row.order_cycle);
        }
    }
    schedules.sort_by_key(|s| s.id);
    schedules.dedup_by_key(|s| s.id);
    for schedule in &mut schedules {
        let mut cycles = cycles_by_schedule.remove(&schedule.id).unwrap_or_default();
        cycles.sort_by(|a, b| a.orders_open_at.cmp(&b.orders_open_at).then(a.id.cmp(&b.id)));
        schedule.order_cycles = cycles;
    }
    trace!("🗃️ Fetched {} of {} requested schedules", schedules.len(), ids.len());
    Ok(schedules)
}

fn push_id_list<T>(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[T])
where T: for<'q> sqlx::Encode<'q, Sqlite> + sqlx::Type<Sqlite> + Copy + Send + 'static {
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    list.push_unseparated(")");
}

pub async fn fetch_schedule_ids_for_order_cycle(
    id: OrderCycleId,
    conn: &mut SqliteConnection,
) -> Result<Vec<ScheduleId>, SqliteDatabaseError> {
    let ids = sqlx::query_scalar::<_, ScheduleId>(
        "SELECT schedule_id FROM schedule_order_cycles WHERE order_cycle_id = $1 ORDER BY schedule_id",
    )
    .bind(id)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

/// Deletes the schedule and its order cycle links. Returns false if the schedule did not exist.
pub async fn delete_schedule(id: ScheduleId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    sqlx::query("DELETE FROM schedule_order_cycles WHERE schedule_id = $1").bind(id).execute(&mut *conn).await?;
    let result = sqlx::query("DELETE FROM schedules WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
