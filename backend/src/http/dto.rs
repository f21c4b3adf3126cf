//! Data Transfer Objects for the HTTP API.
//!
//! Domain types already derive `Serialize`/`Deserialize` and are returned as
//! they are; the types here only wrap them into list envelopes or carry
//! request bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::db::RunRecord;
pub use crate::models::{Block, EventAnchor, Task, Timeline, TimelineInfo, TimelineSnapshot};
pub use crate::scheduler::RecalculationOutcome;
pub use crate::services::{RecalculateOptions, RecalculationSummary};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Repository status
    pub repository: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineListResponse {
    pub timelines: Vec<TimelineInfo>,
    pub total: usize,
}

/// A timeline with its schedulable blocks and tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineDetail {
    pub timeline: Timeline,
    pub blocks: Vec<Block>,
    pub tasks: Vec<Task>,
}

/// Body of `PUT /v1/timelines/{id}/anchor`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAnchorRequest {
    /// New event date; `null` clears it
    #[serde(default, alias = "eventDate", alias = "event_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, alias = "expectedSourceVersion")]
    pub expected_source_version: Option<u64>,
    /// Overwrite even if the anchor moved since `expected_source_version`
    #[serde(default)]
    pub force: bool,
    /// Run a recalculation right after an accepted change
    #[serde(default)]
    pub recalculate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAnchorResponse {
    pub anchor: EventAnchor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recalculation: Option<RecalculationSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunListResponse {
    pub runs: Vec<RunRecord>,
    pub total: usize,
}
