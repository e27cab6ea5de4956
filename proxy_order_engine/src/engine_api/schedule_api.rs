use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db::traits::{ProxyOrderDatabase, ScheduleManagement, SubscriptionManagement},
    db_types::{validate_order_cycle_window, NewOrderCycle, NewSchedule, OrderCycle, OrderCycleId, Schedule, ScheduleId},
    engine_api::{
        errors::ScheduleApiError,
        pinning::PinnedOrders,
        proxy_order_syncer::ProxyOrderSyncer,
        sync_objects::{SyncResult, Synced},
    },
};

/// `ScheduleApi` maintains order cycles and schedules.
///
/// Any change that alters which order cycles a subscription should be in (moving an order cycle's trading window,
/// adding or removing order cycles from a schedule) immediately re-syncs the proxy orders of every affected
/// subscription.
pub struct ScheduleApi<B, P> {
    syncer: ProxyOrderSyncer<B, P>,
}

impl<B, P> Debug for ScheduleApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScheduleApi")
    }
}

impl<B, P> ScheduleApi<B, P> {
    pub fn new(syncer: ProxyOrderSyncer<B, P>) -> Self {
        Self { syncer }
    }

    pub fn syncer(&self) -> &ProxyOrderSyncer<B, P> {
        &self.syncer
    }

    pub fn db(&self) -> &B {
        self.syncer.db()
    }
}

impl<B, P> ScheduleApi<B, P>
where
    B: ProxyOrderDatabase + ScheduleManagement + SubscriptionManagement,
    P: PinnedOrders,
{
    pub async fn create_order_cycle(&self, order_cycle: NewOrderCycle) -> Result<OrderCycle, ScheduleApiError> {
        order_cycle.validate()?;
        let order_cycle = self.db().insert_order_cycle(order_cycle).await.map_err(ScheduleApiError::database)?;
        info!("🗓️ Order cycle {} '{}' created. Trading window is {}", order_cycle.id, order_cycle.name, order_cycle.window());
        Ok(order_cycle)
    }

    pub async fn order_cycle(&self, id: OrderCycleId) -> Result<Option<OrderCycle>, ScheduleApiError> {
        self.db().fetch_order_cycle(id).await.map_err(ScheduleApiError::database)
    }

    /// Moves the trading window of an order cycle, then re-syncs every subscription on every schedule that contains
    /// it.
    pub async fn update_order_cycle_window(
        &self,
        id: OrderCycleId,
        open: DateTime<Utc>,
        close: DateTime<Utc>,
    ) -> Result<Synced<OrderCycle>, ScheduleApiError> {
        validate_order_cycle_window(open, close)?;
        let order_cycle = self
            .db()
            .update_order_cycle_window(id, open, close)
            .await
            .map_err(ScheduleApiError::database)?
            .ok_or(ScheduleApiError::OrderCycleNotFound(id))?;
        debug!("🗓️ Order cycle {id} now trades in {}", order_cycle.window());
        let schedule_ids =
            self.db().fetch_schedule_ids_for_order_cycle(id).await.map_err(ScheduleApiError::database)?;
        let sync_result = self.resync_schedules(&schedule_ids).await?;
        Ok(Synced::new(order_cycle, sync_result))
    }

    /// Creates a new schedule. No subscription can reference it yet, so there is nothing to sync.
    pub async fn create_schedule(&self, schedule: NewSchedule) -> Result<Schedule, ScheduleApiError> {
        schedule.validate()?;
        self.ensure_order_cycles_exist(&schedule.order_cycle_ids).await?;
        let schedule = self.db().insert_schedule(schedule).await.map_err(ScheduleApiError::database)?;
        info!("🗓️ Schedule {} '{}' created with {} order cycles", schedule.id, schedule.name, schedule.order_cycles.len());
        Ok(schedule)
    }

    pub async fn schedule(&self, id: ScheduleId) -> Result<Option<Schedule>, ScheduleApiError> {
        self.db().fetch_schedule(id).await.map_err(ScheduleApiError::database)
    }

    pub async fn add_order_cycles(
        &self,
        id: ScheduleId,
        order_cycles: &[OrderCycleId],
    ) -> Result<Synced<Schedule>, ScheduleApiError> {
        self.ensure_order_cycles_exist(order_cycles).await?;
        self.fetch_existing_schedule(id).await?;
        let added =
            self.db().add_order_cycles_to_schedule(id, order_cycles).await.map_err(ScheduleApiError::database)?;
        debug!("🗓️ {added} order cycles added to {id}");
        self.resynced_schedule(id).await
    }

    pub async fn remove_order_cycles(
        &self,
        id: ScheduleId,
        order_cycles: &[OrderCycleId],
    ) -> Result<Synced<Schedule>, ScheduleApiError> {
        self.fetch_existing_schedule(id).await?;
        let removed =
            self.db().remove_order_cycles_from_schedule(id, order_cycles).await.map_err(ScheduleApiError::database)?;
        debug!("🗓️ {removed} order cycles removed from {id}");
        self.resynced_schedule(id).await
    }

    /// Deletes a schedule. This is refused while any subscription, cancelled ones included, still references it.
    pub async fn delete_schedule(&self, id: ScheduleId) -> Result<(), ScheduleApiError> {
        let subscriptions =
            self.db().fetch_subscriptions_for_schedules(&[id]).await.map_err(ScheduleApiError::database)?;
        if !subscriptions.is_empty() {
            return Err(ScheduleApiError::ScheduleInUse(id, subscriptions.len()));
        }
        if self.db().delete_schedule(id).await.map_err(ScheduleApiError::database)? {
            info!("🗓️ Schedule {id} deleted");
            Ok(())
        } else {
            Err(ScheduleApiError::ScheduleNotFound(id))
        }
    }

    async fn fetch_existing_schedule(&self, id: ScheduleId) -> Result<Schedule, ScheduleApiError> {
        self.schedule(id).await?.ok_or(ScheduleApiError::ScheduleNotFound(id))
    }

    async fn ensure_order_cycles_exist(&self, ids: &[OrderCycleId]) -> Result<(), ScheduleApiError> {
        for id in ids {
            if self.order_cycle(*id).await?.is_none() {
                return Err(ScheduleApiError::OrderCycleNotFound(*id));
            }
        }
        Ok(())
    }

    async fn resynced_schedule(&self, id: ScheduleId) -> Result<Synced<Schedule>, ScheduleApiError> {
        let sync_result = self.resync_schedules(&[id]).await?;
        let schedule = self.fetch_existing_schedule(id).await?;
        Ok(Synced::new(schedule, sync_result))
    }

    /// Cancelled subscriptions are included. They normally have nothing to write, but any active proxy orders left
    /// over from an interrupted cancellation get cancelled here.
    async fn resync_schedules(&self, ids: &[ScheduleId]) -> Result<SyncResult, ScheduleApiError> {
        if ids.is_empty() {
            return Ok(SyncResult::default());
        }
        let subscriptions =
            self.db().fetch_subscriptions_for_schedules(ids).await.map_err(ScheduleApiError::database)?;
        trace!("🗓️ Re-syncing {} subscriptions across {} schedules", subscriptions.len(), ids.len());
        let result = self.syncer.sync(&subscriptions).await?;
        Ok(result)
    }
}
