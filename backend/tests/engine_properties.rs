//! Property tests for the recalculation engine over generated plans.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use leadtime_planner::models::{Block, BlockId, Distribution, Task, TaskId, TimelineId};
use leadtime_planner::scheduler::{
    recalculate, BlockKind, RecalcNote, RecalculationOutcome, RecalculationRequest,
};

#[derive(Debug, Clone)]
struct TaskShape {
    block: usize,
    weight: u32,
    skeleton: bool,
    lock_offset: Option<i64>,
    dependency: Option<usize>,
}

#[derive(Debug, Clone)]
struct Plan {
    today: NaiveDate,
    event_date: NaiveDate,
    kinds: Vec<BlockKind>,
    tasks: Vec<TaskShape>,
    distribution: Distribution,
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

fn task_shape() -> impl Strategy<Value = TaskShape> {
    (
        0usize..7,
        1u32..5,
        any::<bool>(),
        prop::option::weighted(0.25, 0i64..500),
        prop::option::weighted(0.5, 0usize..12),
    )
        .prop_map(|(block, weight, skeleton, lock_offset, dependency)| TaskShape {
            block,
            weight,
            skeleton,
            lock_offset,
            dependency,
        })
}

fn distribution() -> impl Strategy<Value = Distribution> {
    prop_oneof![
        Just(Distribution::Frontload),
        Just(Distribution::Balanced),
        Just(Distribution::Even),
    ]
}

fn plan() -> impl Strategy<Value = Plan> {
    (
        0i64..365,
        0i64..800,
        prop::sample::subsequence(BlockKind::ALL.to_vec(), 1..=BlockKind::ALL.len()),
        prop::collection::vec(task_shape(), 0..12),
        distribution(),
    )
        .prop_map(|(start, lead_days, kinds, tasks, distribution)| {
            let today = base_date() + Duration::days(start);
            Plan {
                today,
                event_date: today + Duration::days(lead_days),
                kinds,
                tasks,
                distribution,
            }
        })
}

impl Plan {
    fn blocks(&self) -> Vec<Block> {
        self.kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| Block {
                id: BlockId(i as i64 + 1),
                timeline_id: TimelineId(1),
                key: kind.key().to_string(),
                title: format!("Block {}", i),
                order: i as i32,
                is_general: false,
                start_date: None,
                end_date: None,
            })
            .collect()
    }

    /// Dependencies only point at earlier tasks, so the graph is acyclic.
    fn tasks(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, shape)| Task {
                id: TaskId(i as i64 + 1),
                timeline_id: TimelineId(1),
                block_id: BlockId((shape.block % self.kinds.len()) as i64 + 1),
                title: format!("Task {}", i),
                weight: shape.weight,
                is_skeleton: shape.skeleton,
                locked: shape.lock_offset.is_some(),
                due_date: shape.lock_offset.map(|days| self.today + Duration::days(days)),
                depends_on: match shape.dependency {
                    Some(dep) if i > 0 => vec![TaskId((dep % i) as i64 + 1)],
                    _ => vec![],
                },
                overdue_on_original_plan: false,
            })
            .collect()
    }

    fn request(&self, tasks: Vec<Task>) -> RecalculationRequest {
        RecalculationRequest::new(self.event_date, self.blocks(), tasks)
            .with_today(self.today)
            .with_distribution(self.distribution)
    }
}

/// Final due date of every dated task after a run.
fn final_dates(tasks: &[Task], outcome: &RecalculationOutcome) -> HashMap<TaskId, NaiveDate> {
    let mut dates: HashMap<TaskId, NaiveDate> = tasks
        .iter()
        .filter_map(|t| t.due_date.map(|d| (t.id, d)))
        .collect();
    for update in &outcome.tasks {
        dates.insert(update.task_id, update.due_date);
    }
    dates
}

proptest! {
    #[test]
    fn prop_windows_are_ordered_and_before_event(plan in plan()) {
        let outcome = recalculate(&plan.request(plan.tasks()));
        prop_assert_eq!(outcome.blocks.len(), plan.kinds.len());
        for window in &outcome.blocks {
            prop_assert!(window.start_date <= window.end_date);
            prop_assert!(window.end_date <= plan.event_date);
        }
    }

    #[test]
    fn prop_every_task_is_accounted_for(plan in plan()) {
        let tasks = plan.tasks();
        let outcome = recalculate(&plan.request(tasks.clone()));
        let locked = tasks.iter().filter(|t| t.locked).count();
        prop_assert_eq!(outcome.skipped_locked_count, locked);
        prop_assert_eq!(
            outcome.tasks.len() + outcome.unassigned_task_ids.len() + locked,
            tasks.len()
        );
    }

    #[test]
    fn prop_placed_tasks_are_not_in_the_past(plan in plan()) {
        let outcome = recalculate(&plan.request(plan.tasks()));
        for update in &outcome.tasks {
            prop_assert!(update.due_date >= plan.today, "{:?}", update);
        }
    }

    #[test]
    fn prop_locked_tasks_are_never_moved(plan in plan()) {
        let tasks = plan.tasks();
        let outcome = recalculate(&plan.request(tasks.clone()));
        for task in tasks.iter().filter(|t| t.locked) {
            prop_assert!(outcome.due_date_for(task.id).is_none());
        }
    }

    #[test]
    fn prop_acyclic_dependencies_are_satisfied(plan in plan()) {
        let tasks = plan.tasks();
        let outcome = recalculate(&plan.request(tasks.clone()));
        let has_cycle_note = outcome
            .notes
            .iter()
            .any(|n| matches!(n, RecalcNote::PossibleDependencyCycle { .. }));
        prop_assert!(!has_cycle_note);

        let dates = final_dates(&tasks, &outcome);
        for update in &outcome.tasks {
            let Some(task) = tasks.iter().find(|t| t.id == update.task_id) else {
                continue;
            };
            for dep in &task.depends_on {
                if let Some(dep_due) = dates.get(dep) {
                    prop_assert!(update.due_date > *dep_due, "{:?} after {:?}", task.id, dep);
                }
            }
        }
    }

    #[test]
    fn prop_due_after_event_is_reported(plan in plan()) {
        let outcome = recalculate(&plan.request(plan.tasks()));
        let late = outcome.tasks.iter().filter(|t| t.due_date > plan.event_date).count();
        let noted = outcome.notes.iter().find_map(|n| match n {
            RecalcNote::DueAfterEvent { count } => Some(*count),
            _ => None,
        });
        prop_assert_eq!(noted.unwrap_or(0), late);
    }

    #[test]
    fn prop_rerun_without_dependencies_changes_nothing(plan in plan()) {
        let mut tasks = plan.tasks();
        for task in &mut tasks {
            task.depends_on.clear();
        }
        let first = recalculate(&plan.request(tasks.clone()));

        for task in &mut tasks {
            if let Some(due) = first.due_date_for(task.id) {
                task.due_date = Some(due);
            }
        }
        let second = recalculate(&plan.request(tasks));
        prop_assert_eq!(second.updated_count, 0);
        prop_assert_eq!(second.blocks, first.blocks);
    }
}
