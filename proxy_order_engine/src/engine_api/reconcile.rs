//! The pure half of proxy order synchronisation.
//!
//! Given one subscription's target order cycles and its existing proxy orders, [`plan_subscription`] decides which
//! proxy orders to create, reactivate and cancel. Nothing here touches the database, so the rules can be tested in
//! isolation and the syncer is left with loading and writing.
use std::collections::{hash_map::Entry, HashMap, HashSet};

use log::warn;

use crate::{
    db_types::{NewProxyOrder, OrderCycle, OrderCycleId, ProxyOrder, Schedule, Subscription, SubscriptionId},
    engine_api::pinning::PinnedOrders,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPlan {
    pub subscription_id: SubscriptionId,
    pub create: Vec<NewProxyOrder>,
    pub reactivate: Vec<ProxyOrder>,
    pub cancel: Vec<ProxyOrder>,
    /// Existing proxy orders that need no write. Includes pinned ones.
    pub untouched: usize,
    pub pinned: usize,
}

impl SubscriptionPlan {
    fn new(subscription_id: SubscriptionId) -> Self {
        Self { subscription_id, create: Vec::new(), reactivate: Vec::new(), cancel: Vec::new(), untouched: 0, pinned: 0 }
    }

    fn keep_pinned(&mut self) {
        self.untouched += 1;
        self.pinned += 1;
    }

    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.reactivate.is_empty() && self.cancel.is_empty()
    }
}

/// The order cycles a subscription should have a proxy order for: every cycle in its schedule whose trading window
/// overlaps the subscription's validity window. Cancelled subscriptions have no target cycles.
pub fn target_cycles<'a>(subscription: &Subscription, schedule: &'a Schedule) -> Vec<&'a OrderCycle> {
    if subscription.is_cancelled() {
        return Vec::new();
    }
    schedule.order_cycles_for(&subscription.valid_window())
}

/// Diffs the target order cycles against the subscription's existing proxy orders.
///
/// | Existing proxy order  | Cycle in target | Cycle not in target |
/// |-----------------------|-----------------|---------------------|
/// | none                  | create          | -                   |
/// | active                | untouched       | cancel              |
/// | cancelled             | reactivate      | untouched           |
/// | pinned (either state) | untouched       | untouched           |
pub fn plan_subscription<P: PinnedOrders + ?Sized>(
    subscription_id: SubscriptionId,
    target: &[&OrderCycle],
    existing: Vec<ProxyOrder>,
    pinned: &P,
) -> SubscriptionPlan {
    let mut plan = SubscriptionPlan::new(subscription_id);
    let mut by_cycle: HashMap<OrderCycleId, ProxyOrder> = HashMap::with_capacity(existing.len());
    for proxy_order in existing {
        match by_cycle.entry(proxy_order.order_cycle_id) {
            Entry::Vacant(slot) => {
                slot.insert(proxy_order);
            },
            Entry::Occupied(_) => {
                warn!(
                    "🗓️ {subscription_id} has more than one proxy order for {}. {} is ignored.",
                    proxy_order.order_cycle_id, proxy_order.id
                );
                plan.untouched += 1;
            },
        }
    }

    let mut seen = HashSet::with_capacity(target.len());
    for order_cycle in target {
        if !seen.insert(order_cycle.id) {
            continue;
        }
        match by_cycle.remove(&order_cycle.id) {
            None => plan.create.push(NewProxyOrder::new(subscription_id, order_cycle.id)),
            Some(proxy_order) if pinned.is_pinned(&proxy_order) => plan.keep_pinned(),
            Some(proxy_order) if proxy_order.is_cancelled() => plan.reactivate.push(proxy_order),
            Some(_) => plan.untouched += 1,
        }
    }

    // Whatever is left belongs to a cycle outside the target.
    for proxy_order in by_cycle.into_values() {
        if pinned.is_pinned(&proxy_order) {
            plan.keep_pinned();
        } else if proxy_order.is_active() {
            plan.cancel.push(proxy_order);
        } else {
            plan.untouched += 1;
        }
    }
    plan.cancel.sort_by_key(|p| p.id);
    plan
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::{
        db_types::{ProxyOrderId, ProxyOrderState, ScheduleId, SubscriptionStatus},
        engine_api::pinning::NeverPinned,
    };

    const SUB: SubscriptionId = SubscriptionId(7);

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn cycles(n: i64) -> Vec<OrderCycle> {
        (0..n)
            .map(|d| OrderCycle {
                id: OrderCycleId(d + 1),
                name: format!("day {d}"),
                coordinator_id: "hub".into(),
                orders_open_at: day(d),
                orders_close_at: day(d + 1),
                created_at: day(-1),
                updated_at: day(-1),
            })
            .collect()
    }

    fn proxy(id: i64, oc: i64, state: ProxyOrderState) -> ProxyOrder {
        ProxyOrder {
            id: ProxyOrderId(id),
            subscription_id: SUB,
            order_cycle_id: OrderCycleId(oc),
            state,
            order_ref: None,
            placed_at: None,
            confirmed_at: None,
            cancelled_at: None,
            created_at: day(-1),
            updated_at: day(-1),
        }
    }

    fn subscription(begins: Option<i64>, ends: Option<i64>, status: SubscriptionStatus) -> Subscription {
        Subscription {
            id: SUB,
            customer_id: "alice".into(),
            shop_id: "shop".into(),
            schedule_id: ScheduleId(1),
            begins_at: begins.map(day),
            ends_at: ends.map(day),
            status,
            created_at: day(-1),
            updated_at: day(-1),
        }
    }

    fn schedule(order_cycles: Vec<OrderCycle>) -> Schedule {
        Schedule { id: ScheduleId(1), name: "daily".into(), created_at: day(-1), updated_at: day(-1), order_cycles }
    }

    #[test]
    fn fresh_subscription_gets_a_proxy_order_per_cycle() {
        let all = cycles(10);
        let target = all.iter().collect::<Vec<_>>();
        let plan = plan_subscription(SUB, &target, vec![], &NeverPinned);
        assert_eq!(plan.create.len(), 10);
        assert!(plan.reactivate.is_empty() && plan.cancel.is_empty());
        assert_eq!(plan.create[0], NewProxyOrder::new(SUB, OrderCycleId(1)));
    }

    #[test]
    fn steady_state_is_a_noop() {
        let all = cycles(3);
        let target = all.iter().collect::<Vec<_>>();
        let existing =
            vec![proxy(1, 1, ProxyOrderState::Active), proxy(2, 2, ProxyOrderState::Active), proxy(3, 3, ProxyOrderState::Active)];
        let plan = plan_subscription(SUB, &target, existing, &NeverPinned);
        assert!(plan.is_noop());
        assert_eq!(plan.untouched, 3);
    }

    #[test]
    fn cycles_leaving_the_target_are_cancelled_and_returning_ones_reactivated() {
        let all = cycles(4);
        let target = vec![&all[0], &all[1], &all[3]];
        let existing = vec![
            proxy(10, 1, ProxyOrderState::Active),
            proxy(11, 2, ProxyOrderState::Cancelled),
            proxy(12, 3, ProxyOrderState::Active),
        ];
        let plan = plan_subscription(SUB, &target, existing, &NeverPinned);
        assert_eq!(plan.create, vec![NewProxyOrder::new(SUB, OrderCycleId(4))]);
        assert_eq!(plan.reactivate.iter().map(|p| p.id.0).collect::<Vec<_>>(), vec![11]);
        assert_eq!(plan.cancel.iter().map(|p| p.id.0).collect::<Vec<_>>(), vec![12]);
        assert_eq!(plan.untouched, 1);
    }

    #[test]
    fn cancelled_proxy_outside_target_stays_cancelled() {
        let plan = plan_subscription(SUB, &[], vec![proxy(1, 1, ProxyOrderState::Cancelled)], &NeverPinned);
        assert!(plan.is_noop());
        assert_eq!(plan.untouched, 1);
    }

    #[test]
    fn pinned_proxy_orders_are_never_written() {
        let all = cycles(2);
        let target = vec![&all[0]];
        let existing = vec![proxy(1, 1, ProxyOrderState::Cancelled), proxy(2, 2, ProxyOrderState::Active)];
        let everything_pinned = |_: &ProxyOrder| true;
        let plan = plan_subscription(SUB, &target, existing, &everything_pinned);
        assert!(plan.is_noop());
        assert_eq!(plan.pinned, 2);
        assert_eq!(plan.untouched, 2);
    }

    #[test]
    fn duplicate_target_cycles_create_one_proxy_order() {
        let all = cycles(1);
        let target = vec![&all[0], &all[0]];
        let plan = plan_subscription(SUB, &target, vec![], &NeverPinned);
        assert_eq!(plan.create.len(), 1);
    }

    #[test]
    fn target_respects_half_open_subscription_window() {
        let s = schedule(cycles(10));
        // Cycle 3 opens exactly at begins_at and is included; cycle 8 opens exactly at ends_at and is excluded.
        let sub = subscription(Some(2), Some(7), SubscriptionStatus::Active);
        let ids = target_cycles(&sub, &s).iter().map(|oc| oc.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn cancelled_subscriptions_have_no_target_but_paused_ones_do() {
        let s = schedule(cycles(5));
        assert!(target_cycles(&subscription(None, None, SubscriptionStatus::Cancelled), &s).is_empty());
        assert_eq!(target_cycles(&subscription(None, None, SubscriptionStatus::Paused), &s).len(), 5);
    }
}
