use crate::{
    db::traits::{AppliedChanges, ProxyOrderChanges},
    db_types::{ProxyOrder, ProxyOrderId, Schedule, ScheduleId, SubscriptionId},
};

/// This trait defines the behaviour a backend must provide for the proxy order syncer.
///
/// The loads are batched: the syncer hands over every id in a batch at once, and implementations are expected to
/// answer each call with a constant number of queries, regardless of how many ids are requested.
#[allow(async_fn_in_trait)]
pub trait ProxyOrderDatabase: Clone {
    type Error: std::error::Error;

    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the requested schedules, each with its full list of order cycles. Ids that do not resolve to a
    /// schedule are silently absent from the result.
    async fn fetch_schedules(&self, ids: &[ScheduleId]) -> Result<Vec<Schedule>, Self::Error>;

    /// Fetches every proxy order, cancelled or not, belonging to any of the given subscriptions.
    async fn fetch_proxy_orders_for_subscriptions(
        &self,
        ids: &[SubscriptionId],
    ) -> Result<Vec<ProxyOrder>, Self::Error>;

    /// Applies the given changes in a single atomic transaction.
    ///
    /// * Inserts never fail on the (subscription, order cycle) uniqueness constraint. The existing row is reported
    ///   in [`AppliedChanges::conflicts`] instead.
    /// * Reactivation only touches rows that are currently cancelled, and cancellation only touches rows that are
    ///   currently active, so applying the same changes twice is harmless.
    async fn apply_proxy_order_changes(&self, changes: ProxyOrderChanges) -> Result<AppliedChanges, Self::Error>;

    async fn fetch_proxy_order(&self, id: ProxyOrderId) -> Result<Option<ProxyOrder>, Self::Error>;

    /// Called by the order materialisation process once a real order exists for the proxy.
    async fn record_materialized_order(&self, id: ProxyOrderId, order_ref: &str) -> Result<ProxyOrder, Self::Error>;

    /// Called by the order materialisation process once the real order has been confirmed.
    async fn mark_order_confirmed(&self, id: ProxyOrderId) -> Result<ProxyOrder, Self::Error>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
