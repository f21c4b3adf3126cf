//! In-memory local repository implementation.
//!
//! Stores timelines, blocks, tasks and run records in maps guarded by a
//! single `parking_lot::RwLock`. Suitable for tests, local development and
//! single-process deployments.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::db::models::RunRecord;
use crate::db::repository::*;
use crate::models::{
    Block, BlockId, EventAnchor, EventId, Task, TaskId, Timeline, TimelineId, TimelineInfo,
    TimelineSnapshot,
};

/// In-memory local repository.
///
/// Cloning is cheap and every clone shares the same data.
///
/// # Example
/// ```ignore
/// let repo = LocalRepository::new();
/// let timeline = repo.store_timeline(&snapshot).await?;
/// let tasks = repo.load_tasks(timeline.id).await?;
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    timelines: HashMap<TimelineId, Timeline>,
    blocks: HashMap<BlockId, Block>,
    tasks: HashMap<TaskId, Task>,
    runs: HashMap<TimelineId, Vec<RunRecord>>,

    next_timeline_id: i64,
    next_event_id: i64,
    next_block_id: i64,
    next_task_id: i64,

    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            timelines: HashMap::new(),
            blocks: HashMap::new(),
            tasks: HashMap::new(),
            runs: HashMap::new(),
            next_timeline_id: 1,
            next_event_id: 1,
            next_block_id: 1,
            next_task_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn timeline(&self, timeline_id: TimelineId, operation: &str) -> RepositoryResult<&Timeline> {
        self.timelines.get(&timeline_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Timeline {} not found", timeline_id),
                ErrorContext::new(operation)
                    .with_entity("timeline")
                    .with_entity_id(timeline_id),
            )
        })
    }

    fn general_blocks(&self, timeline_id: TimelineId) -> HashSet<BlockId> {
        self.blocks
            .values()
            .filter(|b| b.timeline_id == timeline_id && b.is_general)
            .map(|b| b.id)
            .collect()
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn timeline_count(&self) -> usize {
        self.data.read().timelines.len()
    }

    /// Any stored block, general blocks included.
    pub fn block(&self, block_id: BlockId) -> Option<Block> {
        self.data.read().blocks.get(&block_id).cloned()
    }

    /// Any stored task, tasks in general blocks included.
    pub fn task(&self, task_id: TaskId) -> Option<Task> {
        self.data.read().tasks.get(&task_id).cloned()
    }

    /// Edit a stored task in place, as a user would from the checklist.
    pub fn update_task(
        &self,
        task_id: TaskId,
        edit: impl FnOnce(&mut Task),
    ) -> RepositoryResult<()> {
        let mut data = self.data.write();
        let task = data.tasks.get_mut(&task_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Task {} not found", task_id),
                ErrorContext::new("update_task")
                    .with_entity("task")
                    .with_entity_id(task_id),
            )
        })?;
        edit(task);
        Ok(())
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Store is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_snapshot(snapshot: &TimelineSnapshot) -> RepositoryResult<()> {
    let context = || ErrorContext::new("store_timeline").with_entity("timeline");

    let mut block_ids = HashSet::new();
    for block in &snapshot.blocks {
        if !block_ids.insert(block.id) {
            return Err(RepositoryError::validation_with_context(
                format!("Duplicate block id {}", block.id),
                context(),
            ));
        }
    }

    let mut task_ids = HashSet::new();
    for task in &snapshot.tasks {
        if !task_ids.insert(task.id) {
            return Err(RepositoryError::validation_with_context(
                format!("Duplicate task id {}", task.id),
                context(),
            ));
        }
        if !block_ids.contains(&task.block_id) {
            return Err(RepositoryError::validation_with_context(
                format!("Task {} references unknown block {}", task.id, task.block_id),
                context(),
            ));
        }
    }

    for task in &snapshot.tasks {
        if let Some(dep) = task.depends_on.iter().find(|d| !task_ids.contains(*d)) {
            return Err(RepositoryError::validation_with_context(
                format!("Task {} depends on unknown task {}", task.id, dep),
                context(),
            ));
        }
    }

    Ok(())
}

#[async_trait]
impl TimelineRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn list_timelines(&self) -> RepositoryResult<Vec<TimelineInfo>> {
        self.check_health()?;
        let data = self.data.read();
        let mut timelines: Vec<TimelineInfo> = data.timelines.values().map(TimelineInfo::from).collect();
        timelines.sort_by_key(|t| t.timeline_id);
        Ok(timelines)
    }

    async fn get_timeline(&self, timeline_id: TimelineId) -> RepositoryResult<Timeline> {
        self.check_health()?;
        let data = self.data.read();
        data.timeline(timeline_id, "get_timeline").cloned()
    }

    async fn load_event_anchor(&self, timeline_id: TimelineId) -> RepositoryResult<EventAnchor> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data.timeline(timeline_id, "load_event_anchor")?.event.clone())
    }

    async fn load_blocks(&self, timeline_id: TimelineId) -> RepositoryResult<Vec<Block>> {
        self.check_health()?;
        let data = self.data.read();
        data.timeline(timeline_id, "load_blocks")?;

        let mut blocks: Vec<Block> = data
            .blocks
            .values()
            .filter(|b| b.timeline_id == timeline_id && !b.is_general)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| (b.order, b.id));
        Ok(blocks)
    }

    async fn load_tasks(&self, timeline_id: TimelineId) -> RepositoryResult<Vec<Task>> {
        self.check_health()?;
        let data = self.data.read();
        data.timeline(timeline_id, "load_tasks")?;

        let general = data.general_blocks(timeline_id);
        let mut tasks: Vec<Task> = data
            .tasks
            .values()
            .filter(|t| t.timeline_id == timeline_id && !general.contains(&t.block_id))
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    async fn store_timeline(&self, snapshot: &TimelineSnapshot) -> RepositoryResult<Timeline> {
        self.check_health()?;
        validate_snapshot(snapshot)?;

        let mut data = self.data.write();
        let timeline_id = TimelineId(data.next_timeline_id);
        data.next_timeline_id += 1;
        let event_id = EventId(data.next_event_id);
        data.next_event_id += 1;

        let mut block_map = HashMap::with_capacity(snapshot.blocks.len());
        for draft in &snapshot.blocks {
            let id = BlockId(data.next_block_id);
            data.next_block_id += 1;
            block_map.insert(draft.id, id);
            data.blocks.insert(
                id,
                Block {
                    id,
                    timeline_id,
                    key: draft.key.clone(),
                    title: draft.title.clone(),
                    order: draft.order,
                    is_general: draft.is_general,
                    start_date: None,
                    end_date: None,
                },
            );
        }

        let mut task_map = HashMap::with_capacity(snapshot.tasks.len());
        for draft in &snapshot.tasks {
            task_map.insert(draft.id, TaskId(data.next_task_id));
            data.next_task_id += 1;
        }

        for draft in &snapshot.tasks {
            let (Some(&id), Some(&block_id)) = (task_map.get(&draft.id), block_map.get(&draft.block_id))
            else {
                return Err(RepositoryError::internal("Snapshot id remapping failed"));
            };
            let depends_on = draft
                .depends_on
                .iter()
                .filter_map(|dep| task_map.get(dep).copied())
                .collect();
            data.tasks.insert(
                id,
                Task {
                    id,
                    timeline_id,
                    block_id,
                    title: draft.title.clone(),
                    weight: draft.weight,
                    is_skeleton: draft.is_skeleton,
                    locked: draft.locked,
                    due_date: draft.due_date,
                    depends_on,
                    overdue_on_original_plan: false,
                },
            );
        }

        let timeline = Timeline {
            id: timeline_id,
            title: snapshot.title.clone(),
            event: EventAnchor {
                event_id,
                date: snapshot.event_date,
                source_version: 1,
            },
            last_recalculated_at: None,
            scale_factor: None,
        };
        data.timelines.insert(timeline_id, timeline.clone());

        debug!(
            "Stored timeline {} with {} blocks and {} tasks",
            timeline_id,
            snapshot.blocks.len(),
            snapshot.tasks.len()
        );
        Ok(timeline)
    }

    async fn update_event_date(
        &self,
        timeline_id: TimelineId,
        date: Option<NaiveDate>,
        expected_version: Option<u64>,
        force: bool,
    ) -> RepositoryResult<EventAnchor> {
        self.check_health()?;
        let mut data = self.data.write();
        let Some(timeline) = data.timelines.get_mut(&timeline_id) else {
            return Err(RepositoryError::not_found_with_context(
                format!("Timeline {} not found", timeline_id),
                ErrorContext::new("update_event_date")
                    .with_entity("timeline")
                    .with_entity_id(timeline_id),
            ));
        };

        if let Some(expected) = expected_version {
            if expected != timeline.event.source_version && !force {
                return Err(RepositoryError::conflict_with_context(
                    format!(
                        "Event date changed since version {} (now {})",
                        expected, timeline.event.source_version
                    ),
                    ErrorContext::new("update_event_date")
                        .with_entity("timeline")
                        .with_entity_id(timeline_id),
                ));
            }
        }

        if timeline.event.date != date {
            timeline.event.date = date;
            timeline.event.source_version += 1;
        }
        Ok(timeline.event.clone())
    }
}

#[async_trait]
impl RecalculationRepository for LocalRepository {
    async fn persist_block_window(
        &self,
        block_id: BlockId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        let block = data.blocks.get_mut(&block_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Block {} not found", block_id),
                ErrorContext::new("persist_block_window")
                    .with_entity("block")
                    .with_entity_id(block_id),
            )
        })?;
        block.start_date = Some(start_date);
        block.end_date = Some(end_date);
        Ok(())
    }

    async fn persist_task_due_date(
        &self,
        task_id: TaskId,
        due_date: NaiveDate,
        overdue_on_original_plan: Option<bool>,
    ) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        let task = data.tasks.get_mut(&task_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Task {} not found", task_id),
                ErrorContext::new("persist_task_due_date")
                    .with_entity("task")
                    .with_entity_id(task_id),
            )
        })?;
        task.due_date = Some(due_date);
        if let Some(flag) = overdue_on_original_plan {
            task.overdue_on_original_plan = flag;
        }
        Ok(())
    }

    async fn record_run_metadata(&self, record: &RunRecord) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        let Some(timeline) = data.timelines.get_mut(&record.timeline_id) else {
            return Err(RepositoryError::not_found_with_context(
                format!("Timeline {} not found", record.timeline_id),
                ErrorContext::new("record_run_metadata")
                    .with_entity("timeline")
                    .with_entity_id(record.timeline_id),
            ));
        };
        timeline.last_recalculated_at = Some(record.recorded_at);
        timeline.scale_factor = Some(record.scale_factor);
        data.runs
            .entry(record.timeline_id)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn list_run_records(&self, timeline_id: TimelineId) -> RepositoryResult<Vec<RunRecord>> {
        self.check_health()?;
        let data = self.data.read();
        data.timeline(timeline_id, "list_run_records")?;
        Ok(data.runs.get(&timeline_id).cloned().unwrap_or_default())
    }
}
