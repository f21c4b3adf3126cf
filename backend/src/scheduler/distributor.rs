//! Task distribution inside a block window.
//!
//! Locked tasks with a due date anchor the window and cut it into spans.
//! Remaining tasks are ordered by priority, dealt round-robin across the spans
//! and positioned inside their span according to the distribution strategy.

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::window::BlockWindow;
use crate::models::{days_between, shift_days, Distribution, Task, TaskId};

/// Contiguous sub-range of a block window bounded by anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Span {
    /// Positioning length in days; never below one.
    pub fn days(&self) -> i64 {
        days_between(self.end, self.start).max(1)
    }
}

/// Run-wide parameters of the distributor.
#[derive(Debug, Clone, Copy)]
pub struct DistributionContext {
    pub distribution: Distribution,
    pub respect_locks: bool,
    pub today: NaiveDate,
    pub grace_days: u32,
}

/// Due date chosen for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub task_id: TaskId,
    pub due_date: NaiveDate,
    pub overdue_on_original_plan: bool,
}

/// Result of distributing one block.
#[derive(Debug, Clone, Default)]
pub struct BlockDistribution {
    pub placements: Vec<Placement>,
    pub skipped_locked: usize,
    /// Assignable tasks left untouched because the window had no free span
    pub unassigned: Vec<TaskId>,
}

/// Cut a window into spans around anchor dates.
///
/// Anchors outside the window do not cut it. Empty spans are dropped, so a
/// fully anchored window yields no spans.
pub fn partition_spans(window: &BlockWindow, anchors: &[NaiveDate]) -> Vec<Span> {
    let mut anchors: Vec<NaiveDate> = anchors
        .iter()
        .copied()
        .filter(|d| window.contains(*d))
        .collect();
    anchors.sort();
    anchors.dedup();

    let mut spans = Vec::with_capacity(anchors.len() + 1);
    let mut cursor = window.start;

    for anchor in anchors {
        let previous_end = shift_days(anchor, -1);
        if previous_end >= cursor {
            spans.push(Span {
                start: cursor,
                end: previous_end,
            });
        }
        cursor = cursor.max(shift_days(anchor, 1));
    }

    if window.end >= cursor {
        spans.push(Span {
            start: cursor,
            end: window.end,
        });
    }

    spans
}

/// Skeleton tasks first, then heavier tasks, then by title; id breaks ties.
pub fn priority_order(a: &Task, b: &Task) -> Ordering {
    b.is_skeleton
        .cmp(&a.is_skeleton)
        .then_with(|| b.weight.cmp(&a.weight))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

fn fraction(index: usize, count: usize) -> f64 {
    index as f64 / count.saturating_sub(1).max(1) as f64
}

/// Day offset from the span start for the task at `index` of `count`.
pub fn position_offset(
    distribution: Distribution,
    index: usize,
    count: usize,
    span_days: i64,
) -> i64 {
    let span = span_days as f64;
    match distribution {
        Distribution::Even | Distribution::Balanced => (fraction(index, count) * span).round() as i64,
        Distribution::Frontload => {
            let first_half = count.div_ceil(2);
            let quarter = ((0.25 * span).round() as i64).max(1);
            if index < first_half {
                (fraction(index, first_half) * quarter as f64).round() as i64
            } else {
                let second_count = count - first_half;
                let remaining = (span_days - quarter).max(1);
                quarter + (fraction(index - first_half, second_count) * remaining as f64).round() as i64
            }
        }
    }
}

/// Distribute one block's tasks into its window.
///
/// `resolved` holds the best known due date of every task in the run. It is
/// read for dependency floors and updated with every placement.
pub fn distribute_block(
    window: &BlockWindow,
    tasks: &[&Task],
    ctx: &DistributionContext,
    resolved: &mut HashMap<TaskId, NaiveDate>,
) -> BlockDistribution {
    let mut result = BlockDistribution::default();

    let mut assignable: Vec<&Task> = Vec::with_capacity(tasks.len());
    let mut anchors = Vec::new();
    for &task in tasks {
        if ctx.respect_locks && task.locked {
            result.skipped_locked += 1;
            if let Some(due) = task.due_date {
                anchors.push(due);
            }
        } else {
            assignable.push(task);
        }
    }
    assignable.sort_by(|a, b| priority_order(a, b));

    let spans = partition_spans(window, &anchors);
    if spans.is_empty() {
        result.unassigned = assignable.iter().map(|t| t.id).collect();
        return result;
    }

    let mut per_span: Vec<Vec<&Task>> = vec![Vec::new(); spans.len()];
    for (i, task) in assignable.into_iter().enumerate() {
        per_span[i % spans.len()].push(task);
    }

    for (span, span_tasks) in spans.iter().zip(per_span) {
        let count = span_tasks.len();
        for (i, task) in span_tasks.into_iter().enumerate() {
            let offset = position_offset(ctx.distribution, i, count, span.days());
            let mut due = shift_days(span.start, offset);

            let dependency_floor = task
                .depends_on
                .iter()
                .filter_map(|dep| resolved.get(dep))
                .max()
                .map(|latest| shift_days(*latest, 1));
            if let Some(floor) = dependency_floor {
                due = due.max(floor);
            }

            due = due.clamp(span.start, span.end);

            let mut overdue = false;
            if due < ctx.today {
                due = shift_days(ctx.today, ctx.grace_days as i64);
                overdue = true;
            }

            resolved.insert(task.id, due);
            result.placements.push(Placement {
                task_id: task.id,
                due_date: due,
                overdue_on_original_plan: overdue,
            });
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockId, TimelineId};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn task(id: i64, title: &str, weight: u32, is_skeleton: bool) -> Task {
        Task {
            id: TaskId(id),
            timeline_id: TimelineId(1),
            block_id: BlockId(1),
            title: title.to_string(),
            weight,
            is_skeleton,
            locked: false,
            due_date: None,
            depends_on: vec![],
            overdue_on_original_plan: false,
        }
    }

    fn ctx(distribution: Distribution, today: NaiveDate) -> DistributionContext {
        DistributionContext {
            distribution,
            respect_locks: true,
            today,
            grace_days: 2,
        }
    }

    #[test]
    fn test_anchor_splits_window_around_its_day() {
        let window = BlockWindow { start: d(2027, 1, 1), end: d(2027, 1, 20) };
        let spans = partition_spans(&window, &[d(2027, 1, 6)]);
        assert_eq!(
            spans,
            vec![
                Span { start: d(2027, 1, 1), end: d(2027, 1, 5) },
                Span { start: d(2027, 1, 7), end: d(2027, 1, 20) },
            ]
        );
    }

    #[test]
    fn test_anchors_on_window_edges_drop_empty_spans() {
        let window = BlockWindow { start: d(2027, 1, 1), end: d(2027, 1, 3) };
        let spans = partition_spans(&window, &[d(2027, 1, 1), d(2027, 1, 3)]);
        assert_eq!(spans, vec![Span { start: d(2027, 1, 2), end: d(2027, 1, 2) }]);

        let full = partition_spans(&window, &[d(2027, 1, 1), d(2027, 1, 2), d(2027, 1, 3)]);
        assert!(full.is_empty());
    }

    #[test]
    fn test_anchors_outside_window_are_ignored() {
        let window = BlockWindow { start: d(2027, 1, 10), end: d(2027, 1, 20) };
        let spans = partition_spans(&window, &[d(2027, 1, 1), d(2027, 2, 1)]);
        assert_eq!(spans, vec![Span { start: d(2027, 1, 10), end: d(2027, 1, 20) }]);
    }

    #[test]
    fn test_priority_order() {
        let mut tasks = vec![
            task(1, "b", 1, false),
            task(2, "a", 1, false),
            task(3, "z", 5, false),
            task(4, "y", 1, true),
        ];
        tasks.sort_by(priority_order);
        let ids: Vec<i64> = tasks.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_even_positions_cover_span() {
        let offsets: Vec<i64> = (0..5).map(|i| position_offset(Distribution::Even, i, 5, 20)).collect();
        assert_eq!(offsets, vec![0, 5, 10, 15, 20]);
        assert_eq!(position_offset(Distribution::Balanced, 0, 1, 20), 0);
    }

    #[test]
    fn test_frontload_positions() {
        // 4 tasks over 40 days: first half within the first quarter (10 days)
        let offsets: Vec<i64> = (0..4).map(|i| position_offset(Distribution::Frontload, i, 4, 40)).collect();
        assert_eq!(offsets, vec![0, 10, 10, 40]);

        // 5 tasks: three up front, two spread over the remaining 30 days
        let offsets: Vec<i64> = (0..5).map(|i| position_offset(Distribution::Frontload, i, 5, 40)).collect();
        assert_eq!(offsets, vec![0, 5, 10, 10, 40]);
    }

    #[test]
    fn test_round_robin_spreads_priority_tasks() {
        let window = BlockWindow { start: d(2027, 1, 1), end: d(2027, 1, 20) };
        let mut anchor = task(10, "anchor", 1, false);
        anchor.locked = true;
        anchor.due_date = Some(d(2027, 1, 6));
        let a = task(1, "a", 5, true);
        let b = task(2, "b", 4, true);
        let c = task(3, "c", 1, false);
        let tasks = vec![&anchor, &a, &b, &c];

        let mut resolved = HashMap::new();
        let result = distribute_block(&window, &tasks, &ctx(Distribution::Even, d(2026, 10, 18)), &mut resolved);

        assert_eq!(result.skipped_locked, 1);
        let due: HashMap<TaskId, NaiveDate> =
            result.placements.iter().map(|p| (p.task_id, p.due_date)).collect();
        // a and c share the first span, b opens the second one
        assert_eq!(due[&TaskId(1)], d(2027, 1, 1));
        assert_eq!(due[&TaskId(3)], d(2027, 1, 5));
        assert_eq!(due[&TaskId(2)], d(2027, 1, 7));
        assert!(result.placements.iter().all(|p| p.due_date != d(2027, 1, 6)));
    }

    #[test]
    fn test_ignoring_locks_reassigns_locked_tasks() {
        let window = BlockWindow { start: d(2027, 1, 1), end: d(2027, 1, 20) };
        let mut locked = task(1, "locked", 1, false);
        locked.locked = true;
        locked.due_date = Some(d(2027, 1, 10));
        let tasks = vec![&locked];
        let mut context = ctx(Distribution::Even, d(2026, 10, 18));
        context.respect_locks = false;

        let result = distribute_block(&window, &tasks, &context, &mut HashMap::new());
        assert_eq!(result.skipped_locked, 0);
        assert_eq!(result.placements[0].due_date, d(2027, 1, 1));
    }

    #[test]
    fn test_dependency_floor_is_clamped_to_span() {
        let window = BlockWindow { start: d(2027, 1, 1), end: d(2027, 1, 10) };
        let mut dependent = task(2, "dependent", 1, false);
        dependent.depends_on = vec![TaskId(1)];
        let tasks = vec![&dependent];

        let mut resolved = HashMap::from([(TaskId(1), d(2027, 1, 4))]);
        let result = distribute_block(&window, &tasks, &ctx(Distribution::Even, d(2026, 10, 18)), &mut resolved);
        assert_eq!(result.placements[0].due_date, d(2027, 1, 5));

        let mut resolved = HashMap::from([(TaskId(1), d(2027, 3, 1))]);
        let result = distribute_block(&window, &tasks, &ctx(Distribution::Even, d(2026, 10, 18)), &mut resolved);
        assert_eq!(result.placements[0].due_date, d(2027, 1, 10));
        assert_eq!(resolved[&TaskId(2)], d(2027, 1, 10));
    }

    #[test]
    fn test_past_dates_move_to_grace_period() {
        let window = BlockWindow { start: d(2026, 10, 5), end: d(2026, 10, 12) };
        let a = task(1, "a", 1, false);
        let tasks = vec![&a];
        let today = d(2026, 10, 18);

        let result = distribute_block(&window, &tasks, &ctx(Distribution::Even, today), &mut HashMap::new());
        assert_eq!(result.placements[0].due_date, d(2026, 10, 20));
        assert!(result.placements[0].overdue_on_original_plan);
    }

    #[test]
    fn test_fully_anchored_window_leaves_tasks_unassigned() {
        let window = BlockWindow { start: d(2027, 1, 4), end: d(2027, 1, 4) };
        let mut anchor = task(1, "anchor", 1, false);
        anchor.locked = true;
        anchor.due_date = Some(d(2027, 1, 4));
        let free = task(2, "free", 1, false);
        let tasks = vec![&anchor, &free];

        let result = distribute_block(&window, &tasks, &ctx(Distribution::Frontload, d(2026, 10, 18)), &mut HashMap::new());
        assert!(result.placements.is_empty());
        assert_eq!(result.unassigned, vec![TaskId(2)]);
        assert_eq!(result.skipped_locked, 1);
    }

    #[test]
    fn test_locked_task_without_date_is_skipped_but_not_an_anchor() {
        let window = BlockWindow { start: d(2027, 1, 1), end: d(2027, 1, 20) };
        let mut locked = task(1, "undated", 1, false);
        locked.locked = true;
        let free = task(2, "free", 1, false);
        let tasks = vec![&locked, &free];

        let result = distribute_block(&window, &tasks, &ctx(Distribution::Even, d(2026, 10, 18)), &mut HashMap::new());
        assert_eq!(result.skipped_locked, 1);
        assert_eq!(result.placements.len(), 1);
        assert_eq!(result.placements[0].task_id, TaskId(2));
        assert_eq!(result.placements[0].due_date, d(2027, 1, 1));
    }
}
