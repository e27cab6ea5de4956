//! Deciding whether a proxy order is pinned is the job of the order materialisation process. The syncer only ever
//! asks the question through [`PinnedOrders`] and treats the answer as opaque.
use crate::db_types::ProxyOrder;

/// A pinned proxy order has an order that is too far along to be cancelled automatically. The syncer never cancels,
/// reactivates, or deletes a pinned proxy order.
pub trait PinnedOrders {
    fn is_pinned(&self, proxy_order: &ProxyOrder) -> bool;
}

impl<F> PinnedOrders for F
where F: Fn(&ProxyOrder) -> bool
{
    fn is_pinned(&self, proxy_order: &ProxyOrder) -> bool {
        self(proxy_order)
    }
}

/// Nothing is ever pinned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverPinned;

impl PinnedOrders for NeverPinned {
    fn is_pinned(&self, _proxy_order: &ProxyOrder) -> bool {
        false
    }
}

/// Pinned once the materialisation process has reported the order as confirmed via
/// [`crate::ProxyOrderDatabase::mark_order_confirmed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmedOrders;

impl PinnedOrders for ConfirmedOrders {
    fn is_pinned(&self, proxy_order: &ProxyOrder) -> bool {
        proxy_order.confirmed_at.is_some()
    }
}
