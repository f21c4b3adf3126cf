//! Recalculation repository trait: the writes a run produces.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::db::models::RunRecord;
use crate::models::{BlockId, TaskId, TimelineId};

/// Writes emitted by a recalculation run.
///
/// Writes are applied individually; there is no cross-entity transaction.
/// Callers serialize runs per timeline, so a partially applied run is only
/// ever followed by a complete rerun.
#[async_trait]
pub trait RecalculationRepository: Send + Sync {
    /// Store a block's recomputed window.
    async fn persist_block_window(
        &self,
        block_id: BlockId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<()>;

    /// Store a task's recomputed due date.
    ///
    /// # Arguments
    /// * `overdue_on_original_plan` - `Some(true)` sets the flag; `None`
    ///   leaves whatever is stored untouched
    async fn persist_task_due_date(
        &self,
        task_id: TaskId,
        due_date: NaiveDate,
        overdue_on_original_plan: Option<bool>,
    ) -> RepositoryResult<()>;

    /// Append an audit record and stamp the timeline with the run's
    /// `recorded_at` and scale factor.
    async fn record_run_metadata(&self, record: &RunRecord) -> RepositoryResult<()>;

    /// Run records of a timeline, oldest first.
    async fn list_run_records(&self, timeline_id: TimelineId) -> RepositoryResult<Vec<RunRecord>>;
}
