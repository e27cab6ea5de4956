use crate::db_types::{NewProxyOrder, ProxyOrder, ProxyOrderId};

/// The outcome of inserting a proxy order. The (subscription, order cycle) pair is unique, so if another writer got
/// there first, the existing row is returned instead.
#[derive(Debug, Clone)]
pub enum InsertProxyOrderResult {
    Inserted(ProxyOrder),
    AlreadyExists(ProxyOrder),
}

/// A set of proxy order writes that a backend applies in a single atomic transaction.
#[derive(Debug, Clone, Default)]
pub struct ProxyOrderChanges {
    pub create: Vec<NewProxyOrder>,
    pub reactivate: Vec<ProxyOrderId>,
    pub cancel: Vec<ProxyOrderId>,
}

impl ProxyOrderChanges {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.reactivate.is_empty() && self.cancel.is_empty()
    }

    pub fn reactivate_only(ids: Vec<ProxyOrderId>) -> Self {
        Self { reactivate: ids, ..Default::default() }
    }

    pub fn len(&self) -> usize {
        self.create.len() + self.reactivate.len() + self.cancel.len()
    }
}

/// What a backend actually did with a [`ProxyOrderChanges`] request.
#[derive(Debug, Clone, Default)]
pub struct AppliedChanges {
    pub created: Vec<ProxyOrder>,
    /// Rows that already existed when an insert was attempted
    pub conflicts: Vec<ProxyOrder>,
    /// Rows that transitioned from `Cancelled` to `Active`, as written
    pub reactivated: Vec<ProxyOrder>,
    /// Rows that transitioned from `Active` to `Cancelled`, as written
    pub cancelled: Vec<ProxyOrder>,
}
