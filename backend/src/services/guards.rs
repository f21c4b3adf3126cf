//! Per-timeline serialization of recalculation runs.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::TimelineId;

/// Async locks keyed by timeline.
///
/// Runs on the same timeline queue up; different timelines proceed in
/// parallel. Cloning shares the lock table.
#[derive(Clone, Default)]
pub struct TimelineGuards {
    locks: Arc<Mutex<HashMap<TimelineId, Arc<AsyncMutex<()>>>>>,
}

impl TimelineGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `timeline_id`. Released on drop.
    pub async fn acquire(&self, timeline_id: TimelineId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            prune_idle(&mut locks);
            locks.entry(timeline_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of timelines currently held or waited on.
    pub fn tracked(&self) -> usize {
        let mut locks = self.locks.lock();
        prune_idle(&mut locks);
        locks.len()
    }
}

/// Drop entries nobody holds or waits on. Holders and waiters each keep a
/// clone of the `Arc`, so a count of one means only the table references it.
fn prune_idle(locks: &mut HashMap<TimelineId, Arc<AsyncMutex<()>>>) {
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
}
