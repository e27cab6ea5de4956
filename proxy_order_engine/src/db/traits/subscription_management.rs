use crate::db_types::{
    NewSubscription,
    ScheduleId,
    Subscription,
    SubscriptionId,
    SubscriptionStatus,
    SubscriptionUpdate,
};

/// The `SubscriptionManagement` trait defines behaviour for storing and querying subscriptions.
///
/// Subscriptions are never deleted. They are cancelled via [`Self::update_subscription_status`].
#[allow(async_fn_in_trait)]
pub trait SubscriptionManagement {
    type Error: std::error::Error;

    async fn insert_subscription(&self, subscription: NewSubscription) -> Result<Subscription, Self::Error>;

    async fn fetch_subscription(&self, id: SubscriptionId) -> Result<Option<Subscription>, Self::Error>;

    /// Fetches every subscription that is not cancelled, ordered by id. Cancelled subscriptions that still have active
    /// proxy orders are included too, so that a full sync can finish cancelling them.
    async fn fetch_syncable_subscriptions(&self) -> Result<Vec<Subscription>, Self::Error>;

    /// Fetches every subscription (including cancelled ones) attached to any of the given schedules.
    async fn fetch_subscriptions_for_schedules(&self, ids: &[ScheduleId]) -> Result<Vec<Subscription>, Self::Error>;

    /// Applies the update and returns the new subscription, or `None` if it does not exist. Backends do not validate
    /// the resulting window.
    async fn update_subscription(
        &self,
        id: SubscriptionId,
        update: SubscriptionUpdate,
    ) -> Result<Option<Subscription>, Self::Error>;

    async fn update_subscription_status(
        &self,
        id: SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<Option<Subscription>, Self::Error>;
}
