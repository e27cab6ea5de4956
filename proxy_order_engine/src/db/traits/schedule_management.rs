use chrono::{DateTime, Utc};

use crate::db_types::{NewOrderCycle, NewSchedule, OrderCycle, OrderCycleId, Schedule, ScheduleId};

/// The `ScheduleManagement` trait defines behaviour for maintaining order cycles and the schedules that group them.
///
/// Backends do not validate order cycle windows. That is the job of [`crate::ScheduleApi`].
#[allow(async_fn_in_trait)]
pub trait ScheduleManagement {
    type Error: std::error::Error;

    async fn insert_order_cycle(&self, order_cycle: NewOrderCycle) -> Result<OrderCycle, Self::Error>;

    async fn fetch_order_cycle(&self, id: OrderCycleId) -> Result<Option<OrderCycle>, Self::Error>;

    /// Moves the trading window of an order cycle. Returns `None` if the order cycle does not exist.
    async fn update_order_cycle_window(
        &self,
        id: OrderCycleId,
        open: DateTime<Utc>,
        close: DateTime<Utc>,
    ) -> Result<Option<OrderCycle>, Self::Error>;

    /// Creates the schedule and links it to the given order cycles in one transaction.
    async fn insert_schedule(&self, schedule: NewSchedule) -> Result<Schedule, Self::Error>;

    async fn fetch_schedule(&self, id: ScheduleId) -> Result<Option<Schedule>, Self::Error>;

    /// The ids of every schedule that contains the given order cycle.
    async fn fetch_schedule_ids_for_order_cycle(&self, id: OrderCycleId) -> Result<Vec<ScheduleId>, Self::Error>;

    /// Links order cycles to a schedule. Links that already exist are ignored. This function must be idempotent.
    async fn add_order_cycles_to_schedule(&self, id: ScheduleId, order_cycles: &[OrderCycleId])
        -> Result<u64, Self::Error>;

    /// Unlinks order cycles from a schedule. The order cycles themselves are not touched. The number of links
    /// removed is returned.
    async fn remove_order_cycles_from_schedule(
        &self,
        id: ScheduleId,
        order_cycles: &[OrderCycleId],
    ) -> Result<u64, Self::Error>;

    /// Deletes the schedule and its order cycle links. Order cycles are never deleted. Returns false if there was
    /// no such schedule.
    async fn delete_schedule(&self, id: ScheduleId) -> Result<bool, Self::Error>;
}
