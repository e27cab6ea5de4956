use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::time_window::TimeWindow;

macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }
    };
}

id_type!(ScheduleId, "schedule");
id_type!(OrderCycleId, "oc");
id_type!(SubscriptionId, "sub");
id_type!(ProxyOrderId, "po");

//--------------------------------------   ValidationError   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Order cycle opens at {open} but closes at {close}. It must open before it closes.")]
    EmptyOrderCycle { open: DateTime<Utc>, close: DateTime<Utc> },
    #[error("Subscription begins at {begins_at} but ends at {ends_at}. It must begin before it ends.")]
    InvertedSubscriptionWindow { begins_at: DateTime<Utc>, ends_at: DateTime<Utc> },
    #[error("A schedule name cannot be empty")]
    EmptyScheduleName,
}

pub fn validate_order_cycle_window(open: DateTime<Utc>, close: DateTime<Utc>) -> Result<(), ValidationError> {
    if open < close {
        Ok(())
    } else {
        Err(ValidationError::EmptyOrderCycle { open, close })
    }
}

pub fn validate_subscription_window(
    begins_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match (begins_at, ends_at) {
        (Some(begins_at), Some(ends_at)) if begins_at >= ends_at => {
            Err(ValidationError::InvertedSubscriptionWindow { begins_at, ends_at })
        },
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------      OrderCycle      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderCycle {
    pub id: OrderCycleId,
    pub name: String,
    pub coordinator_id: String,
    pub orders_open_at: DateTime<Utc>,
    pub orders_close_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderCycle {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::bounded(self.orders_open_at, self.orders_close_at)
    }
}

#[derive(Debug, Clone)]
pub struct NewOrderCycle {
    pub name: String,
    /// The enterprise coordinating the order cycle
    pub coordinator_id: String,
    pub orders_open_at: DateTime<Utc>,
    pub orders_close_at: DateTime<Utc>,
}

impl NewOrderCycle {
    pub fn new<S: Into<String>>(name: S, orders_open_at: DateTime<Utc>, orders_close_at: DateTime<Utc>) -> Self {
        Self { name: name.into(), coordinator_id: String::default(), orders_open_at, orders_close_at }
    }

    pub fn with_coordinator<S: Into<String>>(mut self, coordinator_id: S) -> Self {
        self.coordinator_id = coordinator_id.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_order_cycle_window(self.orders_open_at, self.orders_close_at)
    }
}

//--------------------------------------       Schedule       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The order cycles in this schedule, sorted by opening time.
    #[sqlx(skip)]
    pub order_cycles: Vec<OrderCycle>,
}

impl Schedule {
    /// The order cycles in this schedule whose trading window overlaps the given validity window.
    pub fn order_cycles_for(&self, window: &TimeWindow) -> Vec<&OrderCycle> {
        self.order_cycles.iter().filter(|oc| oc.window().overlaps(window)).collect()
    }

    pub fn contains_order_cycle(&self, id: OrderCycleId) -> bool {
        self.order_cycles.iter().any(|oc| oc.id == id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSchedule {
    pub name: String,
    pub order_cycle_ids: Vec<OrderCycleId>,
}

impl NewSchedule {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), order_cycle_ids: Vec::new() }
    }

    pub fn with_order_cycles(mut self, ids: &[OrderCycleId]) -> Self {
        self.order_cycle_ids.extend_from_slice(ids);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyScheduleName);
        }
        Ok(())
    }
}

//--------------------------------------  SubscriptionStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    /// Orders are placed in every eligible order cycle.
    Active,
    /// Proxy orders are kept, but the placement job skips them until the subscription is resumed.
    Paused,
    /// Terminal. All proxy orders that are not pinned get cancelled.
    Cancelled,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "Active"),
            SubscriptionStatus::Paused => write!(f, "Paused"),
            SubscriptionStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Paused" => Ok(Self::Paused),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid subscription status: {s}"))),
        }
    }
}

//--------------------------------------     Subscription     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub customer_id: String,
    pub shop_id: String,
    pub schedule_id: ScheduleId,
    /// Inclusive. `None` means the subscription has always been valid.
    pub begins_at: Option<DateTime<Utc>>,
    /// Exclusive. `None` means the subscription never ends.
    pub ends_at: Option<DateTime<Utc>>,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn valid_window(&self) -> TimeWindow {
        TimeWindow::from_bounds(self.begins_at, self.ends_at)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == SubscriptionStatus::Cancelled
    }
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub customer_id: String,
    pub shop_id: String,
    pub schedule_id: ScheduleId,
    pub begins_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl NewSubscription {
    pub fn new<S: Into<String>>(customer_id: S, schedule_id: ScheduleId) -> Self {
        Self { customer_id: customer_id.into(), shop_id: String::default(), schedule_id, begins_at: None, ends_at: None }
    }

    pub fn with_shop<S: Into<String>>(mut self, shop_id: S) -> Self {
        self.shop_id = shop_id.into();
        self
    }

    pub fn beginning_at(mut self, begins_at: DateTime<Utc>) -> Self {
        self.begins_at = Some(begins_at);
        self
    }

    pub fn ending_at(mut self, ends_at: DateTime<Utc>) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_subscription_window(self.begins_at, self.ends_at)
    }
}

/// The fields of a subscription that may be edited. For the validity bounds, `Some(None)` clears the bound.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    pub schedule_id: Option<ScheduleId>,
    pub begins_at: Option<Option<DateTime<Utc>>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
    pub customer_id: Option<String>,
}

impl SubscriptionUpdate {
    pub fn with_schedule_id(mut self, schedule_id: ScheduleId) -> Self {
        self.schedule_id = Some(schedule_id);
        self
    }

    pub fn with_begins_at(mut self, begins_at: Option<DateTime<Utc>>) -> Self {
        self.begins_at = Some(begins_at);
        self
    }

    pub fn with_ends_at(mut self, ends_at: Option<DateTime<Utc>>) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    pub fn with_customer_id<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.schedule_id.is_none() && self.begins_at.is_none() && self.ends_at.is_none() && self.customer_id.is_none()
    }

    /// The validity bounds the subscription would have after this update is applied.
    pub fn merged_bounds(&self, current: &Subscription) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (self.begins_at.unwrap_or(current.begins_at), self.ends_at.unwrap_or(current.ends_at))
    }

    pub fn validate_against(&self, current: &Subscription) -> Result<(), ValidationError> {
        let (begins_at, ends_at) = self.merged_bounds(current);
        validate_subscription_window(begins_at, ends_at)
    }
}

//--------------------------------------    ProxyOrderState   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ProxyOrderState {
    Active,
    /// Soft-removed. The row is kept so that it can be reactivated and for audit purposes.
    Cancelled,
}

impl Display for ProxyOrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyOrderState::Active => write!(f, "Active"),
            ProxyOrderState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for ProxyOrderState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid proxy order state: {s}"))),
        }
    }
}

//--------------------------------------      ProxyOrder      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProxyOrder {
    pub id: ProxyOrderId,
    pub subscription_id: SubscriptionId,
    pub order_cycle_id: OrderCycleId,
    pub state: ProxyOrderState,
    /// Reference to the real order, once one has been materialised for this proxy
    pub order_ref: Option<String>,
    pub placed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProxyOrder {
    pub fn is_active(&self) -> bool {
        self.state == ProxyOrderState::Active
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == ProxyOrderState::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewProxyOrder {
    pub subscription_id: SubscriptionId,
    pub order_cycle_id: OrderCycleId,
}

impl NewProxyOrder {
    pub fn new(subscription_id: SubscriptionId, order_cycle_id: OrderCycleId) -> Self {
        Self { subscription_id, order_cycle_id }
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn subscription(begins_at: Option<DateTime<Utc>>, ends_at: Option<DateTime<Utc>>) -> Subscription {
        Subscription {
            id: SubscriptionId(1),
            customer_id: "alice".into(),
            shop_id: "shop".into(),
            schedule_id: ScheduleId(1),
            begins_at,
            ends_at,
            status: SubscriptionStatus::Active,
            created_at: t0(),
            updated_at: t0(),
        }
    }

    fn cycle(id: i64, day: i64) -> OrderCycle {
        OrderCycle {
            id: OrderCycleId(id),
            name: format!("day {day}"),
            coordinator_id: "hub".into(),
            orders_open_at: t0() + Duration::days(day),
            orders_close_at: t0() + Duration::days(day + 1),
            created_at: t0(),
            updated_at: t0(),
        }
    }

    #[test]
    fn order_cycle_must_open_before_it_closes() {
        assert!(NewOrderCycle::new("ok", t0(), t0() + Duration::hours(1)).validate().is_ok());
        let err = NewOrderCycle::new("zero", t0(), t0()).validate().unwrap_err();
        assert!(matches!(err, ValidationError::EmptyOrderCycle { .. }));
        assert!(NewOrderCycle::new("negative", t0(), t0() - Duration::hours(1)).validate().is_err());
    }

    #[test]
    fn subscription_window_must_not_be_inverted() {
        let s = NewSubscription::new("alice", ScheduleId(1));
        assert!(s.validate().is_ok());
        assert!(s.clone().ending_at(t0()).validate().is_ok());
        assert!(s.clone().beginning_at(t0()).ending_at(t0()).validate().is_err());
        assert!(s.beginning_at(t0() + Duration::days(1)).ending_at(t0()).validate().is_err());
    }

    #[test]
    fn update_validates_against_merged_bounds() {
        let sub = subscription(Some(t0()), Some(t0() + Duration::days(10)));
        let update = SubscriptionUpdate::default().with_ends_at(Some(t0() - Duration::days(1)));
        assert!(update.validate_against(&sub).is_err());
        let update = SubscriptionUpdate::default().with_begins_at(None).with_ends_at(Some(t0() - Duration::days(1)));
        assert!(update.validate_against(&sub).is_ok());
        assert_eq!(update.merged_bounds(&sub), (None, Some(t0() - Duration::days(1))));
        assert!(SubscriptionUpdate::default().is_empty());
    }

    #[test]
    fn schedule_filters_cycles_by_window() {
        let schedule = Schedule {
            id: ScheduleId(1),
            name: "weekly".into(),
            created_at: t0(),
            updated_at: t0(),
            order_cycles: (0..10).map(|d| cycle(d + 1, d)).collect(),
        };
        let sub = subscription(Some(t0() + Duration::days(2)), Some(t0() + Duration::days(5)));
        let ids = schedule.order_cycles_for(&sub.valid_window()).iter().map(|oc| oc.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 4, 5]);
        let sub = subscription(None, None);
        assert_eq!(schedule.order_cycles_for(&sub.valid_window()).len(), 10);
    }

    #[test]
    fn enums_round_trip_through_strings() {
        for status in [SubscriptionStatus::Active, SubscriptionStatus::Paused, SubscriptionStatus::Cancelled] {
            assert_eq!(status.to_string().parse::<SubscriptionStatus>().unwrap(), status);
        }
        assert_eq!("Cancelled".parse::<ProxyOrderState>().unwrap(), ProxyOrderState::Cancelled);
        assert!("Deleted".parse::<ProxyOrderState>().is_err());
    }
}
