//! Recalculation engine.
//!
//! Pure, synchronous and deterministic: a [`RecalculationRequest`] snapshot in,
//! a [`RecalculationOutcome`] out. Persisted runs and previews both go through
//! [`recalculate`].

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::dependencies::{enforce_dependencies, DEFAULT_MAX_DEPENDENCY_PASSES};
use super::distributor::{distribute_block, DistributionContext};
use super::offsets::{resolve_block_key, OffsetSource};
use super::window::{scale_window, BlockWindow, LeadTime};
use crate::models::{today_utc, Block, BlockId, Distribution, Task, TaskId};

/// Days past `today` used for dates that would otherwise be in the past.
pub const DEFAULT_GRACE_DAYS: u32 = 2;

/// In-memory snapshot a run works on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalculationRequest {
    pub event_date: NaiveDate,
    /// Floor below which no due date may fall
    pub today: NaiveDate,
    pub blocks: Vec<Block>,
    pub tasks: Vec<Task>,
    pub distribution: Distribution,
    pub respect_locks: bool,
    pub grace_days: u32,
    pub max_dependency_passes: usize,
}

impl RecalculationRequest {
    /// Request with default options and `today` set to the current UTC date.
    pub fn new(event_date: NaiveDate, blocks: Vec<Block>, tasks: Vec<Task>) -> Self {
        Self {
            event_date,
            today: today_utc(),
            blocks,
            tasks,
            distribution: Distribution::default(),
            respect_locks: true,
            grace_days: DEFAULT_GRACE_DAYS,
            max_dependency_passes: DEFAULT_MAX_DEPENDENCY_PASSES,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_respect_locks(mut self, respect_locks: bool) -> Self {
        self.respect_locks = respect_locks;
        self
    }

    pub fn with_grace_days(mut self, grace_days: u32) -> Self {
        self.grace_days = grace_days;
        self
    }

    pub fn with_max_dependency_passes(mut self, passes: usize) -> Self {
        self.max_dependency_passes = passes;
        self
    }
}

/// Advisory notes attached to a run. None of them abort the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecalcNote {
    /// Lead time below two months
    CompressedSchedule,
    UnresolvedBlockKey { block_id: BlockId, key: String },
    OverlappingBlocks { earlier: BlockId, later: BlockId },
    UnplacedTasks { block_id: BlockId, count: usize },
    PossibleDependencyCycle { passes: usize },
    PinnedDependencyViolation { task_id: TaskId, depends_on: TaskId },
    DueAfterEvent { count: usize },
}

impl fmt::Display for RecalcNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecalcNote::CompressedSchedule => {
                write!(f, "Compressed schedule: weekly mode suggested")
            }
            RecalcNote::UnresolvedBlockKey { block_id, key } => write!(
                f,
                "Block {} has unrecognized key '{}'; scheduled at the event week",
                block_id, key
            ),
            RecalcNote::OverlappingBlocks { earlier, later } => write!(
                f,
                "Block {} starts before block {} ends",
                later, earlier
            ),
            RecalcNote::UnplacedTasks { block_id, count } => write!(
                f,
                "{} task(s) in block {} kept their dates: every day of the window is locked",
                count, block_id
            ),
            RecalcNote::PossibleDependencyCycle { passes } => write!(
                f,
                "Dependency pass stopped after {} iterations: possible unresolved circular dependencies",
                passes
            ),
            RecalcNote::PinnedDependencyViolation {
                task_id,
                depends_on,
            } => write!(
                f,
                "Locked task {} is due before its dependency {}",
                task_id, depends_on
            ),
            RecalcNote::DueAfterEvent { count } => {
                write!(f, "{} task(s) are due after the event date", count)
            }
        }
    }
}

/// New window of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockWindowUpdate {
    pub block_id: BlockId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub offset_source: OffsetSource,
}

/// New due date of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDueDateUpdate {
    pub task_id: TaskId,
    pub due_date: NaiveDate,
    pub previous_due_date: Option<NaiveDate>,
    pub overdue_on_original_plan: bool,
}

impl TaskDueDateUpdate {
    pub fn is_changed(&self) -> bool {
        self.previous_due_date != Some(self.due_date)
    }
}

/// Everything a run produces. The engine persists nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalculationOutcome {
    /// Scale factor rounded to two decimals
    pub scale_factor: f64,
    /// Lead time in average months, rounded to two decimals
    pub lead_time_months: f64,
    pub lead_time_days: i64,
    pub blocks: Vec<BlockWindowUpdate>,
    pub tasks: Vec<TaskDueDateUpdate>,
    pub updated_count: usize,
    pub skipped_locked_count: usize,
    pub unassigned_task_ids: Vec<TaskId>,
    pub notes: Vec<RecalcNote>,
}

impl RecalculationOutcome {
    pub fn note_messages(&self) -> Vec<String> {
        self.notes.iter().map(ToString::to_string).collect()
    }

    pub fn window_for(&self, block_id: BlockId) -> Option<&BlockWindowUpdate> {
        self.blocks.iter().find(|b| b.block_id == block_id)
    }

    pub fn due_date_for(&self, task_id: TaskId) -> Option<NaiveDate> {
        self.tasks
            .iter()
            .find(|t| t.task_id == task_id)
            .map(|t| t.due_date)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Run a full recalculation over the request snapshot.
pub fn recalculate(request: &RecalculationRequest) -> RecalculationOutcome {
    let lead = LeadTime::between(request.event_date, request.today);
    let mut notes = Vec::new();
    if lead.is_compressed() {
        notes.push(RecalcNote::CompressedSchedule);
    }

    let mut blocks: Vec<&Block> = request.blocks.iter().filter(|b| !b.is_general).collect();
    blocks.sort_by_key(|b| (b.order, b.id));

    let mut windows: Vec<(BlockId, BlockWindow)> = Vec::with_capacity(blocks.len());
    let mut block_updates = Vec::with_capacity(blocks.len());
    for block in &blocks {
        let resolved = resolve_block_key(&block.key);
        if !resolved.is_resolved() {
            notes.push(RecalcNote::UnresolvedBlockKey {
                block_id: block.id,
                key: block.key.clone(),
            });
        }
        let window = scale_window(request.event_date, &resolved.offsets, lead.scale_factor);
        debug!(
            "Block {} ('{}') window {} .. {}",
            block.id, block.key, window.start, window.end
        );
        windows.push((block.id, window));
        block_updates.push(BlockWindowUpdate {
            block_id: block.id,
            start_date: window.start,
            end_date: window.end,
            offset_source: resolved.source,
        });
    }

    for pair in windows.windows(2) {
        let ((earlier, first), (later, second)) = (pair[0], pair[1]);
        if first.overlaps_next(&second) {
            notes.push(RecalcNote::OverlappingBlocks { earlier, later });
        }
    }

    let mut by_block: HashMap<BlockId, Vec<&Task>> = HashMap::new();
    for task in &request.tasks {
        by_block.entry(task.block_id).or_default().push(task);
    }

    let mut dates: HashMap<TaskId, NaiveDate> = request
        .tasks
        .iter()
        .filter_map(|t| t.due_date.map(|d| (t.id, d)))
        .collect();

    let ctx = DistributionContext {
        distribution: request.distribution,
        respect_locks: request.respect_locks,
        today: request.today,
        grace_days: request.grace_days,
    };

    let mut placements = Vec::new();
    let mut skipped_locked_count = 0;
    let mut unassigned_task_ids = Vec::new();
    for (block_id, window) in &windows {
        let Some(block_tasks) = by_block.get(block_id) else {
            continue;
        };
        let distribution = distribute_block(window, block_tasks, &ctx, &mut dates);
        skipped_locked_count += distribution.skipped_locked;
        if !distribution.unassigned.is_empty() {
            notes.push(RecalcNote::UnplacedTasks {
                block_id: *block_id,
                count: distribution.unassigned.len(),
            });
            unassigned_task_ids.extend(distribution.unassigned);
        }
        placements.extend(distribution.placements);
    }

    let movable: HashSet<TaskId> = placements.iter().map(|p| p.task_id).collect();
    let report = enforce_dependencies(
        &request.tasks,
        &mut dates,
        &movable,
        request.max_dependency_passes,
    );
    if !report.converged {
        notes.push(RecalcNote::PossibleDependencyCycle {
            passes: report.passes,
        });
    }
    for (task_id, depends_on) in report.pinned_violations {
        notes.push(RecalcNote::PinnedDependencyViolation {
            task_id,
            depends_on,
        });
    }

    let previous: HashMap<TaskId, Option<NaiveDate>> =
        request.tasks.iter().map(|t| (t.id, t.due_date)).collect();
    let task_updates: Vec<TaskDueDateUpdate> = placements
        .iter()
        .map(|p| TaskDueDateUpdate {
            task_id: p.task_id,
            due_date: dates.get(&p.task_id).copied().unwrap_or(p.due_date),
            previous_due_date: previous.get(&p.task_id).copied().flatten(),
            overdue_on_original_plan: p.overdue_on_original_plan,
        })
        .collect();

    let after_event = task_updates
        .iter()
        .filter(|t| t.due_date > request.event_date)
        .count();
    if after_event > 0 {
        notes.push(RecalcNote::DueAfterEvent { count: after_event });
    }

    let updated_count = task_updates.iter().filter(|t| t.is_changed()).count();

    info!(
        "Recalculated {} blocks: scale factor {:.2}, {} updated, {} locked skipped, {} notes",
        block_updates.len(),
        lead.scale_factor,
        updated_count,
        skipped_locked_count,
        notes.len()
    );

    RecalculationOutcome {
        scale_factor: round2(lead.scale_factor),
        lead_time_months: round2(lead.months),
        lead_time_days: lead.days,
        blocks: block_updates,
        tasks: task_updates,
        updated_count,
        skipped_locked_count,
        unassigned_task_ids,
        notes,
    }
}
