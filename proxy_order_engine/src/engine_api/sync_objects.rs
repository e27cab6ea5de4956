use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{db_types::SubscriptionId, engine_api::errors::SyncError};

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Knobs for a sync run. These are passed in explicitly when the syncer is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// How many subscriptions are loaded and reconciled together. Each batch costs a fixed number of queries.
    pub batch_size: usize,
    /// Compute and report the changes, but do not write anything or publish events.
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE, dry_run: false }
    }
}

impl SyncOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub subscription_id: SubscriptionId,
    pub error: SyncError,
}

/// The outcome of a sync run. The counts are for observability; nothing downstream should branch on them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Number of distinct subscriptions that were reconciled
    pub subscriptions: usize,
    pub created: usize,
    pub reactivated: usize,
    pub cancelled: usize,
    /// Proxy orders that needed no write, pinned ones included
    pub untouched: usize,
    /// Proxy orders that were left alone because they are pinned
    pub pinned: usize,
    /// Inserts that collided with a row written by someone else and were resolved without an error
    pub conflicts: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncResult {
    pub fn total_writes(&self) -> usize {
        self.created + self.reactivated + self.cancelled
    }

    pub fn is_noop(&self) -> bool {
        self.total_writes() == 0
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            subscriptions: self.subscriptions,
            created: self.created,
            reactivated: self.reactivated,
            cancelled: self.cancelled,
            untouched: self.untouched,
            pinned: self.pinned,
            conflicts: self.conflicts,
            failed: self.failures.len(),
        }
    }

    pub(crate) fn merge(&mut self, other: SyncResult) {
        self.subscriptions += other.subscriptions;
        self.created += other.created;
        self.reactivated += other.reactivated;
        self.cancelled += other.cancelled;
        self.untouched += other.untouched;
        self.pinned += other.pinned;
        self.conflicts += other.conflicts;
        self.failures.extend(other.failures);
    }
}

/// The result of a lifecycle operation together with the proxy order sync it triggered.
#[derive(Debug, Clone)]
pub struct Synced<T> {
    pub value: T,
    pub sync_result: SyncResult,
}

impl<T> Synced<T> {
    pub fn new(value: T, sync_result: SyncResult) -> Self {
        Self { value, sync_result }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub subscriptions: usize,
    pub created: usize,
    pub reactivated: usize,
    pub cancelled: usize,
    pub untouched: usize,
    pub pinned: usize,
    pub conflicts: usize,
    pub failed: usize,
}

impl Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} subscriptions: {} created, {} reactivated, {} cancelled, {} untouched ({} pinned), {} conflicts, {} \
             failed",
            self.subscriptions,
            self.created,
            self.reactivated,
            self.cancelled,
            self.untouched,
            self.pinned,
            self.conflicts,
            self.failed
        )
    }
}
