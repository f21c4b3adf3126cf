//! Records owned by the persistence layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Distribution, TimelineId};

/// Audit entry appended after every persisted recalculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub timeline_id: TimelineId,
    pub recorded_at: DateTime<Utc>,
    pub scale_factor: f64,
    pub lead_time_months: f64,
    pub distribution: Distribution,
    pub respect_locks: bool,
    pub updated_count: usize,
    pub skipped_locked_count: usize,
    pub notes: Vec<String>,
    /// Event anchor version the run was computed from
    pub source_version: u64,
    /// SHA-256 of the recalculation input
    pub input_fingerprint: String,
}
