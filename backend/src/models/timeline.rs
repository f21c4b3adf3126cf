//! Timeline domain types: event anchor, blocks and tasks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_id_type!(i64, TimelineId);
crate::define_id_type!(i64, EventId);
crate::define_id_type!(i64, BlockId);
crate::define_id_type!(i64, TaskId);

/// Strategy used to position tasks inside a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// First half of the tasks lands in the first quarter of the span.
    #[default]
    Frontload,
    /// Uniform spread across the span.
    Balanced,
    /// Uniform spread across the span.
    Even,
}

impl Distribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Distribution::Frontload => "frontload",
            Distribution::Balanced => "balanced",
            Distribution::Even => "even",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "frontload" | "front-load" | "front_load" => Ok(Self::Frontload),
            "balanced" => Ok(Self::Balanced),
            "even" => Ok(Self::Even),
            other => Err(format!("Unknown distribution: {}", other)),
        }
    }
}

/// Versioned read of the event date every timeline date is relative to.
///
/// `source_version` increases on every accepted date change and acts as an
/// optimistic-concurrency token for writers and recalculation callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAnchor {
    pub event_id: EventId,
    pub date: Option<NaiveDate>,
    pub source_version: u64,
}

/// A titled phase of the plan with a canonical offset before the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub timeline_id: TimelineId,
    /// Canonical offset key, e.g. `"8-10m"` or `"2w"`
    pub key: String,
    pub title: String,
    /// Display order; not used for scheduling
    pub order: i32,
    /// Catch-all block never subject to date scheduling
    #[serde(default)]
    pub is_general: bool,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// A unit of checklist work belonging to exactly one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub timeline_id: TimelineId,
    pub block_id: BlockId,
    pub title: String,
    pub weight: u32,
    #[serde(default)]
    pub is_skeleton: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default, alias = "depends_on_task_ids")]
    pub depends_on: Vec<TaskId>,
    #[serde(default)]
    pub overdue_on_original_plan: bool,
}

/// Timeline header as owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub id: TimelineId,
    pub title: String,
    pub event: EventAnchor,
    pub last_recalculated_at: Option<DateTime<Utc>>,
    pub scale_factor: Option<f64>,
}

/// Lightweight listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineInfo {
    pub timeline_id: TimelineId,
    pub title: String,
    pub event_date: Option<NaiveDate>,
}

impl From<&Timeline> for TimelineInfo {
    fn from(t: &Timeline) -> Self {
        Self {
            timeline_id: t.id,
            title: t.title.clone(),
            event_date: t.event.date,
        }
    }
}

/// Block as submitted in an import; `id` is a reference local to the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDraft {
    pub id: i64,
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub is_general: bool,
}

/// Task as submitted in an import; ids and references are local to the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub id: i64,
    pub block_id: i64,
    pub title: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub is_skeleton: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default, alias = "depends_on_task_ids")]
    pub depends_on: Vec<i64>,
}

fn default_weight() -> u32 {
    1
}

/// Complete timeline submitted for import into a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSnapshot {
    pub title: String,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub blocks: Vec<BlockDraft>,
    #[serde(default)]
    pub tasks: Vec<TaskDraft>,
}
