//! Loading, running and persisting recalculations.

use chrono::{NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::guards::TimelineGuards;
use crate::db::{fingerprint, FullRepository, RecalculationSettings, RepositoryError, RunRecord};
use crate::models::{today_utc, Distribution, EventAnchor, TaskId, TimelineId};
use crate::scheduler::{recalculate, RecalculationOutcome, RecalculationRequest};

/// Per-call options. Unset fields fall back to [`RecalculationSettings`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecalculateOptions {
    #[serde(default, alias = "respectLocks")]
    pub respect_locks: Option<bool>,
    #[serde(default)]
    pub distribution: Option<Distribution>,
    /// Reject the run if the event anchor moved past this version
    #[serde(default, alias = "expectedSourceVersion")]
    pub expected_source_version: Option<u64>,
    /// Reference date; defaults to the current UTC date
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// What a persisted run reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalculationSummary {
    pub run_id: Uuid,
    pub timeline_id: TimelineId,
    pub scale_factor: f64,
    pub lead_time_months: f64,
    pub updated_count: usize,
    pub skipped_locked_count: usize,
    pub unassigned_task_ids: Vec<TaskId>,
    pub notes: Vec<String>,
    pub source_version: u64,
}

/// Build the engine input from stored state.
async fn load_request<R: FullRepository + ?Sized>(
    repo: &R,
    timeline_id: TimelineId,
    options: &RecalculateOptions,
    settings: &RecalculationSettings,
) -> ServiceResult<(EventAnchor, RecalculationRequest)> {
    let anchor = repo.load_event_anchor(timeline_id).await?;

    if let Some(expected) = options.expected_source_version {
        if expected != anchor.source_version {
            warn!(
                "Timeline {}: recalculation requested for version {}, anchor is at {}",
                timeline_id, expected, anchor.source_version
            );
            return Err(ServiceError::SourceVersionConflict {
                timeline_id,
                expected,
                actual: anchor.source_version,
            });
        }
    }

    let event_date = anchor
        .date
        .ok_or(ServiceError::MissingEventDate { timeline_id })?;

    let blocks = repo.load_blocks(timeline_id).await?;
    let tasks = repo.load_tasks(timeline_id).await?;

    let request = RecalculationRequest::new(event_date, blocks, tasks)
        .with_today(options.today.unwrap_or_else(today_utc))
        .with_distribution(options.distribution.unwrap_or(settings.default_distribution))
        .with_respect_locks(options.respect_locks.unwrap_or(settings.respect_locks))
        .with_grace_days(settings.grace_days)
        .with_max_dependency_passes(settings.max_dependency_passes);

    Ok((anchor, request))
}

/// Compute a recalculation without writing anything.
pub async fn preview_recalculation<R: FullRepository + ?Sized>(
    repo: &R,
    timeline_id: TimelineId,
    options: &RecalculateOptions,
    settings: &RecalculationSettings,
) -> ServiceResult<RecalculationOutcome> {
    let (_, request) = load_request(repo, timeline_id, options, settings).await?;
    Ok(recalculate(&request))
}

/// Recalculate a timeline and persist the result.
///
/// Runs on the same timeline are serialized through `guards`. Writes are
/// issued in order: block windows, task due dates, then the run record. A
/// missing event date or a stale `expected_source_version` aborts before any
/// write.
pub async fn recalculate_timeline<R: FullRepository + ?Sized>(
    repo: &R,
    guards: &TimelineGuards,
    timeline_id: TimelineId,
    options: &RecalculateOptions,
    settings: &RecalculationSettings,
) -> ServiceResult<RecalculationSummary> {
    let _guard = guards.acquire(timeline_id).await;

    let (anchor, request) = load_request(repo, timeline_id, options, settings).await?;
    let input_fingerprint = fingerprint(&request).map_err(|e| {
        RepositoryError::internal(format!("Failed to fingerprint recalculation input: {}", e))
    })?;
    let outcome = recalculate(&request);

    for window in &outcome.blocks {
        repo.persist_block_window(window.block_id, window.start_date, window.end_date)
            .await?;
    }
    for update in outcome.tasks.iter().filter(|t| t.is_changed() || t.overdue_on_original_plan) {
        repo.persist_task_due_date(
            update.task_id,
            update.due_date,
            update.overdue_on_original_plan.then_some(true),
        )
        .await?;
    }

    let notes = outcome.note_messages();
    let record = RunRecord {
        run_id: Uuid::new_v4(),
        timeline_id,
        recorded_at: Utc::now(),
        scale_factor: outcome.scale_factor,
        lead_time_months: outcome.lead_time_months,
        distribution: request.distribution,
        respect_locks: request.respect_locks,
        updated_count: outcome.updated_count,
        skipped_locked_count: outcome.skipped_locked_count,
        notes: notes.clone(),
        source_version: anchor.source_version,
        input_fingerprint,
    };
    repo.record_run_metadata(&record).await?;

    info!(
        "Timeline {} recalculated (run {}): {} updated, {} locked skipped",
        timeline_id, record.run_id, outcome.updated_count, outcome.skipped_locked_count
    );

    Ok(RecalculationSummary {
        run_id: record.run_id,
        timeline_id,
        scale_factor: outcome.scale_factor,
        lead_time_months: outcome.lead_time_months,
        updated_count: outcome.updated_count,
        skipped_locked_count: outcome.skipped_locked_count,
        unassigned_task_ids: outcome.unassigned_task_ids,
        notes,
        source_version: anchor.source_version,
    })
}
