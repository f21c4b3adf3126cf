//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer. The engine is cheap, so recalculations run inline.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    HealthResponse, RecalculateOptions, RecalculationOutcome, RecalculationSummary,
    RunListResponse, TimelineDetail, TimelineListResponse, TimelineSnapshot, UpdateAnchorRequest,
    UpdateAnchorResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::db::TimelineRepository;
use crate::models::{EventAnchor, Timeline, TimelineId};
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Empty bodies select the defaults.
fn parse_options(body: &Bytes) -> Result<RecalculateOptions, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RecalculateOptions::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid recalculation options: {}", e)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repo_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository: repo_status,
    }))
}

// =============================================================================
// Timelines
// =============================================================================

/// GET /v1/timelines
pub async fn list_timelines(State(state): State<AppState>) -> HandlerResult<TimelineListResponse> {
    let timelines = db_services::list_timelines(state.repository.as_ref()).await?;
    let total = timelines.len();
    Ok(Json(TimelineListResponse { timelines, total }))
}

/// POST /v1/timelines
///
/// Import a timeline snapshot. IDs in the snapshot are local references and
/// are replaced by store-assigned IDs.
pub async fn create_timeline(
    State(state): State<AppState>,
    Json(snapshot): Json<TimelineSnapshot>,
) -> Result<(StatusCode, Json<Timeline>), AppError> {
    let timeline = db_services::store_timeline(state.repository.as_ref(), &snapshot).await?;
    Ok((StatusCode::CREATED, Json(timeline)))
}

/// GET /v1/timelines/{timeline_id}
pub async fn get_timeline(
    State(state): State<AppState>,
    Path(timeline_id): Path<i64>,
) -> HandlerResult<TimelineDetail> {
    let timeline_id = TimelineId::new(timeline_id);
    let repo = state.repository.as_ref();

    let timeline = db_services::get_timeline(repo, timeline_id).await?;
    let blocks = repo.load_blocks(timeline_id).await?;
    let tasks = repo.load_tasks(timeline_id).await?;

    Ok(Json(TimelineDetail {
        timeline,
        blocks,
        tasks,
    }))
}

// =============================================================================
// Event Anchor
// =============================================================================

/// GET /v1/timelines/{timeline_id}/anchor
pub async fn get_anchor(
    State(state): State<AppState>,
    Path(timeline_id): Path<i64>,
) -> HandlerResult<EventAnchor> {
    let anchor =
        services::get_event_anchor(state.repository.as_ref(), TimelineId::new(timeline_id)).await?;
    Ok(Json(anchor))
}

/// PUT /v1/timelines/{timeline_id}/anchor
///
/// Move the event date, optionally recalculating against the new version.
pub async fn update_anchor(
    State(state): State<AppState>,
    Path(timeline_id): Path<i64>,
    Json(request): Json<UpdateAnchorRequest>,
) -> HandlerResult<UpdateAnchorResponse> {
    let timeline_id = TimelineId::new(timeline_id);
    let repo = state.repository.as_ref();

    let anchor = services::update_event_anchor(
        repo,
        &state.guards,
        timeline_id,
        request.date,
        request.expected_source_version,
        request.force,
    )
    .await?;

    let recalculation = if request.recalculate && anchor.date.is_some() {
        let options = RecalculateOptions {
            expected_source_version: Some(anchor.source_version),
            ..Default::default()
        };
        Some(
            services::recalculate_timeline(repo, &state.guards, timeline_id, &options, &state.settings)
                .await?,
        )
    } else {
        None
    };

    Ok(Json(UpdateAnchorResponse {
        anchor,
        recalculation,
    }))
}

// =============================================================================
// Recalculation
// =============================================================================

/// POST /v1/timelines/{timeline_id}/recalculate
///
/// Body (optional): `{"respect_locks": bool, "distribution": "frontload" |
/// "balanced" | "even", "expected_source_version": n}`.
pub async fn recalculate(
    State(state): State<AppState>,
    Path(timeline_id): Path<i64>,
    body: Bytes,
) -> HandlerResult<RecalculationSummary> {
    let options = parse_options(&body)?;
    let summary = services::recalculate_timeline(
        state.repository.as_ref(),
        &state.guards,
        TimelineId::new(timeline_id),
        &options,
        &state.settings,
    )
    .await?;
    Ok(Json(summary))
}

/// POST /v1/timelines/{timeline_id}/recalculate/preview
///
/// Same input as `recalculate`; returns the full outcome and writes nothing.
pub async fn preview_recalculation(
    State(state): State<AppState>,
    Path(timeline_id): Path<i64>,
    body: Bytes,
) -> HandlerResult<RecalculationOutcome> {
    let options = parse_options(&body)?;
    let outcome = services::preview_recalculation(
        state.repository.as_ref(),
        TimelineId::new(timeline_id),
        &options,
        &state.settings,
    )
    .await?;
    Ok(Json(outcome))
}

/// GET /v1/timelines/{timeline_id}/runs
pub async fn list_runs(
    State(state): State<AppState>,
    Path(timeline_id): Path<i64>,
) -> HandlerResult<RunListResponse> {
    let runs =
        db_services::list_run_records(state.repository.as_ref(), TimelineId::new(timeline_id)).await?;
    let total = runs.len();
    Ok(Json(RunListResponse { runs, total }))
}
