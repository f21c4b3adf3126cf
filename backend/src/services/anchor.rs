//! Event anchor reads and writes.

use chrono::NaiveDate;
use log::{info, warn};

use super::error::ServiceResult;
use super::guards::TimelineGuards;
use crate::db::{FullRepository, RepositoryError};
use crate::models::{EventAnchor, TimelineId};

pub async fn get_event_anchor<R: FullRepository + ?Sized>(
    repo: &R,
    timeline_id: TimelineId,
) -> ServiceResult<EventAnchor> {
    Ok(repo.load_event_anchor(timeline_id).await?)
}

/// Move a timeline's event date.
///
/// With `expected_version` set and `force` unset, a write racing another
/// writer fails with a conflict instead of silently overwriting it.
///
/// The write waits for any recalculation in progress on the timeline.
pub async fn update_event_anchor<R: FullRepository + ?Sized>(
    repo: &R,
    guards: &TimelineGuards,
    timeline_id: TimelineId,
    date: Option<NaiveDate>,
    expected_version: Option<u64>,
    force: bool,
) -> ServiceResult<EventAnchor> {
    let _guard = guards.acquire(timeline_id).await;
    match repo
        .update_event_date(timeline_id, date, expected_version, force)
        .await
    {
        Ok(anchor) => {
            info!(
                "Timeline {} event date set to {:?} (version {})",
                timeline_id, anchor.date, anchor.source_version
            );
            Ok(anchor)
        }
        Err(e @ RepositoryError::Conflict { .. }) => {
            warn!("Timeline {} event date update rejected: {}", timeline_id, e);
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
