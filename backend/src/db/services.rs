//! Repository-agnostic database operations.
//!
//! Thin functions over the repository traits holding the checks that must be
//! identical for every storage backend.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers / recalculation service                  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  db::services - import validation, logging              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/)                        │
//! │  - TimelineRepository                                   │
//! │  - RecalculationRepository                              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!             ┌───────▼──────────┐
//!             │ Local Repository │
//!             │ (in-memory)      │
//!             └──────────────────┘
//! ```

use log::info;

use super::models::RunRecord;
use super::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::models::{Timeline, TimelineId, TimelineInfo, TimelineSnapshot};

pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

pub async fn list_timelines<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<TimelineInfo>> {
    repo.list_timelines().await
}

pub async fn get_timeline<R: FullRepository + ?Sized>(
    repo: &R,
    timeline_id: TimelineId,
) -> RepositoryResult<Timeline> {
    repo.get_timeline(timeline_id).await
}

/// Import a timeline snapshot.
///
/// Rejects an empty title and zero task weights before reaching the store.
pub async fn store_timeline<R: FullRepository + ?Sized>(
    repo: &R,
    snapshot: &TimelineSnapshot,
) -> RepositoryResult<Timeline> {
    let context = || ErrorContext::new("store_timeline").with_entity("timeline");

    if snapshot.title.trim().is_empty() {
        return Err(RepositoryError::validation_with_context(
            "Timeline title must not be empty",
            context(),
        ));
    }
    if let Some(task) = snapshot.tasks.iter().find(|t| t.weight == 0) {
        return Err(RepositoryError::validation_with_context(
            format!("Task {} has zero weight", task.id),
            context(),
        ));
    }

    let timeline = repo.store_timeline(snapshot).await?;
    info!(
        "Imported timeline {} '{}' ({} blocks, {} tasks)",
        timeline.id,
        timeline.title,
        snapshot.blocks.len(),
        snapshot.tasks.len()
    );
    Ok(timeline)
}

pub async fn list_run_records<R: FullRepository + ?Sized>(
    repo: &R,
    timeline_id: TimelineId,
) -> RepositoryResult<Vec<RunRecord>> {
    repo.list_run_records(timeline_id).await
}
