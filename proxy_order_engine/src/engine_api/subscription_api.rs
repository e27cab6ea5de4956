use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{ProxyOrderDatabase, ScheduleManagement, SubscriptionManagement},
    db_types::{NewSubscription, ScheduleId, Subscription, SubscriptionId, SubscriptionStatus, SubscriptionUpdate},
    engine_api::{
        errors::SubscriptionApiError,
        pinning::PinnedOrders,
        proxy_order_syncer::ProxyOrderSyncer,
        sync_objects::{SyncResult, Synced},
    },
};

/// `SubscriptionApi` manages the subscription lifecycle. Every change that affects which order cycles a
/// subscription should be in is followed by a sync of that subscription's proxy orders.
pub struct SubscriptionApi<B, P> {
    syncer: ProxyOrderSyncer<B, P>,
}

impl<B, P> Debug for SubscriptionApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SubscriptionApi")
    }
}

impl<B, P> SubscriptionApi<B, P> {
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

impl<B, P> SubscriptionApi<B, P>
where
    B: ProxyOrderDatabase + ScheduleManagement + SubscriptionManagement,
    P: PinnedOrders,
{
    /// Creates the subscription and its initial set of proxy orders.
    pub async fn create_subscription(
        &self,
        subscription: NewSubscription,
    ) -> Result<Synced<Subscription>, SubscriptionApiError> {
        subscription.validate()?;
        self.ensure_schedule_exists(subscription.schedule_id).await?;
        let subscription =
            self.db().insert_subscription(subscription).await.map_err(SubscriptionApiError::database)?;
        info!(
            "🗓️ Subscription {} for customer '{}' created on {}",
            subscription.id, subscription.customer_id, subscription.schedule_id
        );
        self.synced(subscription).await
    }

    pub async fn subscription(&self, id: SubscriptionId) -> Result<Option<Subscription>, SubscriptionApiError> {
        self.db().fetch_subscription(id).await.map_err(SubscriptionApiError::database)
    }

    /// Edits the subscription and re-syncs its proxy orders. The resulting validity window is checked against the
    /// current values before anything is written.
    pub async fn update_subscription(
        &self,
        id: SubscriptionId,
        update: SubscriptionUpdate,
    ) -> Result<Synced<Subscription>, SubscriptionApiError> {
        let current = self.fetch_existing(id).await?;
        update.validate_against(&current)?;
        if let Some(schedule_id) = update.schedule_id {
            self.ensure_schedule_exists(schedule_id).await?;
        }
        let subscription = self
            .db()
            .update_subscription(id, update)
            .await
            .map_err(SubscriptionApiError::database)?
            .ok_or(SubscriptionApiError::SubscriptionNotFound(id))?;
        debug!("🗓️ Subscription {id} updated. Valid for {}", subscription.valid_window());
        self.synced(subscription).await
    }

    /// Pausing does not change which order cycles a subscription belongs to, so no sync is needed.
    pub async fn pause_subscription(&self, id: SubscriptionId) -> Result<Subscription, SubscriptionApiError> {
        self.change_status(id, SubscriptionStatus::Paused).await
    }

    pub async fn resume_subscription(&self, id: SubscriptionId) -> Result<Subscription, SubscriptionApiError> {
        self.change_status(id, SubscriptionStatus::Active).await
    }

    /// Cancels the subscription and every proxy order that is not pinned. Cancelled subscriptions cannot be
    /// resumed.
    pub async fn cancel_subscription(&self, id: SubscriptionId) -> Result<Synced<Subscription>, SubscriptionApiError> {
        let subscription = self.change_status(id, SubscriptionStatus::Cancelled).await?;
        self.synced(subscription).await
    }

    /// Syncs every subscription that has not been cancelled, along with cancelled subscriptions that still have active
    /// proxy orders.
    pub async fn sync_all(&self) -> Result<SyncResult, SubscriptionApiError> {
        let subscriptions = self.db().fetch_syncable_subscriptions().await.map_err(SubscriptionApiError::database)?;
        debug!("🗓️ {} subscriptions are due for a sync", subscriptions.len());
        let result = self.syncer.sync(&subscriptions).await?;
        Ok(result)
    }

    async fn change_status(
        &self,
        id: SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<Subscription, SubscriptionApiError> {
        let current = self.fetch_existing(id).await?;
        if current.status == status {
            trace!("🗓️ Subscription {id} is already {status}");
            return Ok(current);
        }
        if current.is_cancelled() {
            return Err(SubscriptionApiError::InvalidStatusChange(id, current.status, status));
        }
        let subscription = self
            .db()
            .update_subscription_status(id, status)
            .await
            .map_err(SubscriptionApiError::database)?
            .ok_or(SubscriptionApiError::SubscriptionNotFound(id))?;
        info!("🗓️ Subscription {id} changed from {} to {status}", current.status);
        Ok(subscription)
    }

    async fn fetch_existing(&self, id: SubscriptionId) -> Result<Subscription, SubscriptionApiError> {
        self.subscription(id).await?.ok_or(SubscriptionApiError::SubscriptionNotFound(id))
    }

    async fn ensure_schedule_exists(&self, id: ScheduleId) -> Result<(), SubscriptionApiError> {
        match self.db().fetch_schedule(id).await.map_err(SubscriptionApiError::database)? {
            Some(_) => Ok(()),
            None => Err(SubscriptionApiError::ScheduleNotFound(id)),
        }
    }

    async fn synced(&self, subscription: Subscription) -> Result<Synced<Subscription>, SubscriptionApiError> {
        let sync_result = self.syncer.sync_subscription(&subscription).await?;
        Ok(Synced::new(subscription, sync_result))
    }
}
