use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fmt::Debug,
};

use log::*;

use crate::{
    db::traits::{ProxyOrderChanges, ProxyOrderDatabase},
    db_types::{ProxyOrder, Schedule, ScheduleId, Subscription, SubscriptionId},
    engine_api::{
        errors::SyncError,
        pinning::PinnedOrders,
        reconcile::{plan_subscription, target_cycles},
        sync_objects::{SyncFailure, SyncOptions, SyncResult},
    },
    events::{EventProducers, ProxyOrderChange, ProxyOrderChangedEvent, SyncCompletedEvent},
};

/// `ProxyOrderSyncer` brings the proxy orders of a set of subscriptions in line with their schedules.
///
/// For every subscription, the target set is the order cycles in its schedule whose trading window overlaps the
/// subscription's validity window. Missing proxy orders are created, cancelled ones in the target are reactivated
/// and active ones outside the target are cancelled. Proxy orders that the `pinned` predicate reports as pinned are
/// never written.
///
/// Subscriptions are processed in batches of [`SyncOptions::batch_size`]. Each batch costs one schedule load, one
/// proxy order load, and at most two write transactions, no matter how many subscriptions or order cycles it holds.
#[derive(Clone)]
pub struct ProxyOrderSyncer<B, P> {
    db: B,
    pinned: P,
    options: SyncOptions,
    producers: EventProducers,
}

impl<B, P> Debug for ProxyOrderSyncer<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProxyOrderSyncer ({:?})", self.options)
    }
}

impl<B, P> ProxyOrderSyncer<B, P> {
    pub fn new(db: B, pinned: P) -> Self {
        Self { db, pinned, options: SyncOptions::default(), producers: EventProducers::default() }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_producers(mut self, producers: EventProducers) -> Self {
        self.producers = producers;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B, P> ProxyOrderSyncer<B, P>
where
    B: ProxyOrderDatabase,
    P: PinnedOrders,
{
    /// Reconciles the proxy orders of every given subscription.
    ///
    /// Subscriptions whose schedule cannot be found are skipped and reported in [`SyncResult::failures`]. A database
    /// failure aborts the run. Batches that were already committed stay committed, and running the sync again picks
    /// up where the failed run left off.
    pub async fn sync(&self, subscriptions: &[Subscription]) -> Result<SyncResult, SyncError> {
        let mut result = SyncResult::default();
        if subscriptions.is_empty() {
            debug!("🗓️ Nothing to sync");
            return Ok(result);
        }
        let mut seen = HashSet::with_capacity(subscriptions.len());
        let unique = subscriptions.iter().filter(|s| seen.insert(s.id)).collect::<Vec<&Subscription>>();
        if unique.len() < subscriptions.len() {
            debug!("🗓️ {} duplicate subscriptions ignored", subscriptions.len() - unique.len());
        }
        let batch_size = self.options.batch_size.max(1);
        trace!("🗓️ Syncing {} subscriptions in batches of {batch_size}", unique.len());
        for (i, batch) in unique.chunks(batch_size).enumerate() {
            let batch_result = self.sync_batch(batch).await.map_err(|e| {
                error!("🗓️ Sync aborted in batch {i}. {e}");
                e
            })?;
            result.merge(batch_result);
        }
        let summary = result.summary();
        if self.options.dry_run {
            info!("🗓️ Dry run complete. Would have written {summary}");
        } else {
            info!("🗓️ Sync complete. {summary}");
            for emitter in &self.producers.sync_completed_producer {
                emitter.publish_event(SyncCompletedEvent::new(summary)).await;
            }
        }
        Ok(result)
    }

    /// Convenience wrapper around [`Self::sync`] for a single subscription.
    pub async fn sync_subscription(&self, subscription: &Subscription) -> Result<SyncResult, SyncError> {
        self.sync(std::slice::from_ref(subscription)).await
    }

    async fn sync_batch(&self, batch: &[&Subscription]) -> Result<SyncResult, SyncError> {
        let mut result = SyncResult::default();
        let schedules = self.load_schedules(batch).await?;
        let mut existing = self.load_proxy_orders(batch).await?;

        let mut changes = ProxyOrderChanges::default();
        let mut reactivating = 0;
        let mut cancelling = 0;
        for subscription in batch {
            let Some(schedule) = schedules.get(&subscription.schedule_id) else {
                let error =
                    SyncError::ConfigurationError { subscription: subscription.id, schedule: subscription.schedule_id };
                warn!("🗓️ {error}. It will be skipped.");
                result.failures.push(SyncFailure { subscription_id: subscription.id, error });
                continue;
            };
            let target = target_cycles(subscription, schedule);
            let current = existing.remove(&subscription.id).unwrap_or_default();
            let plan = plan_subscription(subscription.id, &target, current, &self.pinned);
            trace!(
                "🗓️ {}: {} target cycles. {} to create, {} to reactivate, {} to cancel",
                subscription.id,
                target.len(),
                plan.create.len(),
                plan.reactivate.len(),
                plan.cancel.len()
            );
            result.subscriptions += 1;
            result.untouched += plan.untouched;
            result.pinned += plan.pinned;
            reactivating += plan.reactivate.len();
            cancelling += plan.cancel.len();
            changes.create.extend(plan.create);
            changes.reactivate.extend(plan.reactivate.iter().map(|p| p.id));
            changes.cancel.extend(plan.cancel.iter().map(|p| p.id));
        }

        if changes.is_empty() {
            return Ok(result);
        }
        if self.options.dry_run {
            result.created += changes.create.len();
            result.reactivated += reactivating;
            result.cancelled += cancelling;
            return Ok(result);
        }

        let applied = self.db.apply_proxy_order_changes(changes).await.map_err(SyncError::database)?;
        result.created += applied.created.len();
        result.reactivated += applied.reactivated.len();
        result.cancelled += applied.cancelled.len();
        // Rows that another writer moved before we got to them need no write from us, and get no event.
        result.untouched += reactivating.saturating_sub(applied.reactivated.len());
        result.untouched += cancelling.saturating_sub(applied.cancelled.len());
        let late_reactivations = self.resolve_conflicts(applied.conflicts, &mut result).await?;

        self.notify(applied.created, ProxyOrderChange::Created).await;
        self.notify(applied.reactivated, ProxyOrderChange::Reactivated).await;
        self.notify(late_reactivations, ProxyOrderChange::Reactivated).await;
        self.notify(applied.cancelled, ProxyOrderChange::Cancelled).await;
        Ok(result)
    }

    async fn load_schedules(&self, batch: &[&Subscription]) -> Result<HashMap<ScheduleId, Schedule>, SyncError> {
        let ids = batch.iter().map(|s| s.schedule_id).collect::<BTreeSet<_>>().into_iter().collect::<Vec<_>>();
        let schedules = self.db.fetch_schedules(&ids).await.map_err(SyncError::database)?;
        trace!("🗓️ {} of {} schedules loaded", schedules.len(), ids.len());
        Ok(schedules.into_iter().map(|s| (s.id, s)).collect())
    }

    async fn load_proxy_orders(
        &self,
        batch: &[&Subscription],
    ) -> Result<HashMap<SubscriptionId, Vec<ProxyOrder>>, SyncError> {
        let ids = batch.iter().map(|s| s.id).collect::<Vec<_>>();
        let proxy_orders = self.db.fetch_proxy_orders_for_subscriptions(&ids).await.map_err(SyncError::database)?;
        let mut by_subscription: HashMap<SubscriptionId, Vec<ProxyOrder>> = HashMap::with_capacity(ids.len());
        for proxy_order in proxy_orders {
            by_subscription.entry(proxy_order.subscription_id).or_default().push(proxy_order);
        }
        Ok(by_subscription)
    }

    /// An insert collided with a proxy order that appeared after the batch was loaded. The existing row is treated
    /// as if it had been loaded: a cancelled, unpinned row is reactivated and anything else is left alone.
    async fn resolve_conflicts(
        &self,
        conflicts: Vec<ProxyOrder>,
        result: &mut SyncResult,
    ) -> Result<Vec<ProxyOrder>, SyncError> {
        if conflicts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("🗓️ {} proxy orders were created by another writer during this sync", conflicts.len());
        result.conflicts += conflicts.len();
        let mut to_reactivate = Vec::new();
        for proxy_order in conflicts {
            if self.pinned.is_pinned(&proxy_order) {
                result.untouched += 1;
                result.pinned += 1;
            } else if proxy_order.is_cancelled() {
                to_reactivate.push(proxy_order);
            } else {
                result.untouched += 1;
            }
        }
        if to_reactivate.is_empty() {
            return Ok(Vec::new());
        }
        let ids = to_reactivate.iter().map(|p| p.id).collect();
        let applied =
            self.db.apply_proxy_order_changes(ProxyOrderChanges::reactivate_only(ids)).await.map_err(SyncError::database)?;
        result.reactivated += applied.reactivated.len();
        result.untouched += to_reactivate.len().saturating_sub(applied.reactivated.len());
        Ok(applied.reactivated)
    }

    /// Publishes one event per proxy order. The rows are the ones the backend reported as written.
    async fn notify(&self, proxy_orders: Vec<ProxyOrder>, change: ProxyOrderChange) {
        if proxy_orders.is_empty() || self.producers.proxy_order_changed_producer.is_empty() {
            return;
        }
        debug!("🗓️ Notifying proxy order changed hook subscribers of {} {change:?} events", proxy_orders.len());
        for proxy_order in proxy_orders {
            for emitter in &self.producers.proxy_order_changed_producer {
                emitter.publish_event(ProxyOrderChangedEvent::new(proxy_order.clone(), change)).await;
            }
        }
    }
}
