//! Timeline repository trait: event anchor, blocks and tasks.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{Block, EventAnchor, Task, Timeline, TimelineId, TimelineInfo, TimelineSnapshot};

/// Read access to timelines plus the two writes that do not come from a
/// recalculation run: importing a timeline and moving its event date.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait TimelineRepository: Send + Sync {
    /// Check if the store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the store is healthy
    /// - `Ok(false)` if the store is unhealthy but no error occurred
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// List all timelines with their current event date.
    async fn list_timelines(&self) -> RepositoryResult<Vec<TimelineInfo>>;

    /// Retrieve a timeline header by ID.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the timeline doesn't exist
    async fn get_timeline(&self, timeline_id: TimelineId) -> RepositoryResult<Timeline>;

    /// Versioned read of the event date the timeline is anchored to.
    ///
    /// A timeline without an event date still yields an anchor with
    /// `date: None`; only an unknown timeline is an error.
    async fn load_event_anchor(&self, timeline_id: TimelineId) -> RepositoryResult<EventAnchor>;

    /// All blocks of a timeline, general blocks excluded.
    async fn load_blocks(&self, timeline_id: TimelineId) -> RepositoryResult<Vec<Block>>;

    /// All tasks of a timeline, tasks in general blocks excluded.
    async fn load_tasks(&self, timeline_id: TimelineId) -> RepositoryResult<Vec<Task>>;

    /// Import a timeline snapshot, assigning fresh IDs.
    ///
    /// # Arguments
    /// * `snapshot` - Blocks and tasks with snapshot-local IDs and references
    ///
    /// # Returns
    /// * `Ok(Timeline)` - The stored timeline header
    /// * `Err(RepositoryError::ValidationError)` - If a task references an
    ///   unknown block or dependency inside the snapshot
    async fn store_timeline(&self, snapshot: &TimelineSnapshot) -> RepositoryResult<Timeline>;

    /// Move the event date.
    ///
    /// The write is rejected with `RepositoryError::Conflict` when
    /// `expected_version` does not match the stored version, unless `force`
    /// is set. Accepted writes bump `source_version`.
    ///
    /// # Returns
    /// * `Ok(EventAnchor)` - The anchor after the write
    async fn update_event_date(
        &self,
        timeline_id: TimelineId,
        date: Option<NaiveDate>,
        expected_version: Option<u64>,
        force: bool,
    ) -> RepositoryResult<EventAnchor>;
}
