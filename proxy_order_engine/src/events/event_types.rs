use serde::{Deserialize, Serialize};

use crate::{db_types::ProxyOrder, engine_api::sync_objects::SyncSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyOrderChange {
    Created,
    Reactivated,
    Cancelled,
}

/// Emitted for every proxy order the syncer writes. Untouched proxy orders produce no event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyOrderChangedEvent {
    pub proxy_order: ProxyOrder,
    pub change: ProxyOrderChange,
}

impl ProxyOrderChangedEvent {
    pub fn new(proxy_order: ProxyOrder, change: ProxyOrderChange) -> Self {
        Self { proxy_order, change }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCompletedEvent {
    pub summary: SyncSummary,
}

impl SyncCompletedEvent {
    pub fn new(summary: SyncSummary) -> Self {
        Self { summary }
    }
}
