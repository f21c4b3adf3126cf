//! End-to-end scenarios for the recalculation pipeline.

use chrono::NaiveDate;

use super::*;
use crate::models::{Block, BlockId, Distribution, Task, TaskId, TimelineId};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn block(id: i64, key: &str, order: i32) -> Block {
    Block {
        id: BlockId(id),
        timeline_id: TimelineId(1),
        key: key.to_string(),
        title: format!("Block {}", key),
        order,
        is_general: false,
        start_date: None,
        end_date: None,
    }
}

fn task(id: i64, block_id: i64, title: &str) -> Task {
    Task {
        id: TaskId(id),
        timeline_id: TimelineId(1),
        block_id: BlockId(block_id),
        title: title.to_string(),
        weight: 1,
        is_skeleton: false,
        locked: false,
        due_date: None,
        depends_on: vec![],
        overdue_on_original_plan: false,
    }
}

fn skeleton(id: i64, block_id: i64, title: &str) -> Task {
    Task {
        is_skeleton: true,
        ..task(id, block_id, title)
    }
}

// 2026-10-19 is a Monday; the event is one year out
fn twelve_month_today() -> NaiveDate {
    d(2026, 10, 19)
}

fn twelve_month_event() -> NaiveDate {
    d(2027, 10, 19)
}

fn twelve_month_request(tasks: Vec<Task>) -> RecalculationRequest {
    RecalculationRequest::new(twelve_month_event(), vec![block(1, "12m", 0)], tasks)
        .with_today(twelve_month_today())
}

fn apply(tasks: &mut [Task], outcome: &RecalculationOutcome) {
    for t in tasks.iter_mut() {
        if let Some(due) = outcome.due_date_for(t.id) {
            t.due_date = Some(due);
        }
    }
}

#[test]
fn test_twelve_month_frontload_places_skeleton_early() {
    let tasks = vec![
        task(1, 1, "Order invitations"),
        skeleton(2, 1, "Set budget"),
        task(3, 1, "Pick florist"),
        skeleton(4, 1, "Book venue"),
    ];
    let outcome = recalculate(&twelve_month_request(tasks));

    assert_eq!(outcome.scale_factor, 1.0);
    assert!(outcome.notes.is_empty(), "unexpected notes: {:?}", outcome.notes);

    let window = outcome.window_for(BlockId(1)).unwrap();
    assert_eq!(window.start_date, d(2026, 10, 19));
    assert_eq!(window.end_date, d(2026, 12, 14));

    // First quarter of a 56-day window
    let quarter_end = d(2026, 11, 2);
    for id in [2, 4] {
        let due = outcome.due_date_for(TaskId(id)).unwrap();
        assert!(due >= window.start_date && due <= quarter_end, "skeleton {} at {}", id, due);
    }
    assert_eq!(outcome.due_date_for(TaskId(4)), Some(d(2026, 10, 19)));
    for id in [1, 3] {
        let due = outcome.due_date_for(TaskId(id)).unwrap();
        assert!(due >= quarter_end && due <= window.end_date);
    }
    assert_eq!(outcome.updated_count, 4);
    assert_eq!(outcome.skipped_locked_count, 0);
}

#[test]
fn test_locked_anchor_is_preserved_and_avoided() {
    let mut anchor = task(10, 1, "Engagement party");
    anchor.locked = true;
    anchor.due_date = Some(d(2026, 10, 24));
    let tasks = vec![
        anchor,
        task(1, 1, "a"),
        task(2, 1, "b"),
        task(3, 1, "c"),
        task(4, 1, "d"),
    ];
    let outcome = recalculate(&twelve_month_request(tasks).with_distribution(Distribution::Even));

    assert_eq!(outcome.skipped_locked_count, 1);
    assert!(outcome.due_date_for(TaskId(10)).is_none());
    for update in &outcome.tasks {
        assert_ne!(update.due_date, d(2026, 10, 24));
    }
    // Two spans, tasks dealt alternately starting with the first one
    assert_eq!(outcome.due_date_for(TaskId(1)), Some(d(2026, 10, 19)));
    assert_eq!(outcome.due_date_for(TaskId(2)), Some(d(2026, 10, 25)));
}

#[test]
fn test_compressed_lead_time() {
    let today = d(2026, 10, 18);
    let event = d(2026, 10, 28);
    let blocks = vec![block(1, "8-10m", 0), block(2, "2w", 1)];
    let tasks = vec![task(1, 1, "Book venue"), task(2, 2, "Confirm caterer")];
    let outcome = recalculate(&RecalculationRequest::new(event, blocks, tasks).with_today(today));

    assert!(outcome.scale_factor < 0.05);
    assert!(outcome.lead_time_months < 1.0);
    assert!(outcome.notes.contains(&RecalcNote::CompressedSchedule));
    assert!(outcome
        .note_messages()
        .contains(&"Compressed schedule: weekly mode suggested".to_string()));

    // Both windows collapse onto the event week
    for update in &outcome.blocks {
        assert_eq!(update.start_date, d(2026, 10, 26));
        assert_eq!(update.end_date, d(2026, 10, 26));
    }
    for update in &outcome.tasks {
        assert!(update.due_date >= today && update.due_date <= event);
    }
}

#[test]
fn test_dependency_is_pushed_past_locked_dependency() {
    let mut venue = task(1, 1, "Book venue");
    venue.locked = true;
    venue.due_date = Some(d(2027, 1, 30));
    let mut decor = task(2, 1, "Plan decor");
    decor.depends_on = vec![TaskId(1)];

    let outcome = recalculate(&twelve_month_request(vec![venue, decor]));
    assert_eq!(outcome.due_date_for(TaskId(2)), Some(d(2027, 1, 31)));
    assert!(outcome.due_date_for(TaskId(1)).is_none());
}

#[test]
fn test_dependency_across_blocks() {
    let blocks = vec![block(1, "12m", 0), block(2, "8-10m", 1)];
    let first = task(1, 2, "Send invitations");
    let mut second = task(2, 1, "Track replies");
    second.depends_on = vec![TaskId(1)];

    let request = RecalculationRequest::new(twelve_month_event(), blocks, vec![first, second])
        .with_today(twelve_month_today());
    let outcome = recalculate(&request);

    let dep = outcome.due_date_for(TaskId(1)).unwrap();
    let dependent = outcome.due_date_for(TaskId(2)).unwrap();
    assert!(dependent > dep);
}

#[test]
fn test_same_day_rerun_is_stable() {
    let mut tasks = vec![
        skeleton(1, 1, "Set budget"),
        task(2, 1, "Draft guest list"),
        task(3, 1, "Pick florist"),
    ];
    let first = recalculate(&twelve_month_request(tasks.clone()));
    apply(&mut tasks, &first);

    let second = recalculate(&twelve_month_request(tasks));
    assert_eq!(second.updated_count, 0);
    for (a, b) in first.tasks.iter().zip(&second.tasks) {
        assert_eq!(a.task_id, b.task_id);
        assert_eq!(a.due_date, b.due_date);
    }
}

#[test]
fn test_no_due_date_before_today() {
    // Event four months out: the early blocks would fall in the past unscaled
    let today = d(2026, 10, 18);
    let event = d(2027, 2, 18);
    let blocks = BlockKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| block(i as i64 + 1, kind.key(), i as i32))
        .collect();
    let tasks = (1..=7)
        .flat_map(|b| (0..3).map(move |i| task(b * 10 + i, b, &format!("task {}", i))))
        .collect();

    let outcome = recalculate(&RecalculationRequest::new(event, blocks, tasks).with_today(today));
    assert_eq!(outcome.tasks.len(), 21);
    for update in &outcome.tasks {
        assert!(update.due_date >= today, "{} due {}", update.task_id, update.due_date);
    }
}

#[test]
fn test_general_blocks_are_not_scheduled() {
    let mut general = block(9, "general", 5);
    general.is_general = true;
    let tasks = vec![task(1, 1, "Book venue"), task(2, 9, "Misc")];
    let request = RecalculationRequest::new(twelve_month_event(), vec![block(1, "12m", 0), general], tasks)
        .with_today(twelve_month_today());

    let outcome = recalculate(&request);
    assert!(outcome.window_for(BlockId(9)).is_none());
    assert!(outcome.due_date_for(TaskId(2)).is_none());
    assert!(outcome.due_date_for(TaskId(1)).is_some());
}

#[test]
fn test_canonical_plan_has_no_overlap_notes() {
    let blocks = BlockKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| block(i as i64 + 1, kind.key(), i as i32))
        .collect();
    let outcome = recalculate(
        &RecalculationRequest::new(twelve_month_event(), blocks, vec![]).with_today(twelve_month_today()),
    );
    assert_eq!(outcome.blocks.len(), 7);
    assert!(!outcome
        .notes
        .iter()
        .any(|n| matches!(n, RecalcNote::OverlappingBlocks { .. })));

    let mut previous_start = None;
    for update in &outcome.blocks {
        assert!(update.start_date <= update.end_date);
        assert!(update.end_date <= twelve_month_event());
        if let Some(prev) = previous_start {
            assert!(update.start_date >= prev);
        }
        previous_start = Some(update.start_date);
    }
}

#[test]
fn test_unresolved_key_is_reported() {
    let request = RecalculationRequest::new(
        twelve_month_event(),
        vec![block(1, "whenever", 0)],
        vec![task(1, 1, "Something")],
    )
    .with_today(twelve_month_today());

    let outcome = recalculate(&request);
    assert!(outcome.notes.contains(&RecalcNote::UnresolvedBlockKey {
        block_id: BlockId(1),
        key: "whenever".to_string(),
    }));
    assert_eq!(outcome.window_for(BlockId(1)).unwrap().offset_source, OffsetSource::Unresolved);
}

#[test]
fn test_out_of_range_legacy_key_is_reported() {
    let key = "99999999999999999999m";
    let request = RecalculationRequest::new(
        twelve_month_event(),
        vec![block(1, key, 0)],
        vec![task(1, 1, "Something")],
    )
    .with_today(twelve_month_today());

    let outcome = recalculate(&request);
    assert!(outcome.notes.contains(&RecalcNote::UnresolvedBlockKey {
        block_id: BlockId(1),
        key: key.to_string(),
    }));
    let window = outcome.window_for(BlockId(1)).unwrap();
    assert!(window.start_date > twelve_month_today());
    assert!(window.end_date <= twelve_month_event());
    assert!(outcome.tasks.iter().all(|t| !t.overdue_on_original_plan));
}

#[test]
fn test_dependency_cycle_is_noted() {
    let mut a = task(1, 1, "a");
    a.depends_on = vec![TaskId(2)];
    let mut b = task(2, 1, "b");
    b.depends_on = vec![TaskId(1)];

    let outcome = recalculate(&twelve_month_request(vec![a, b]).with_max_dependency_passes(5));
    assert!(outcome
        .notes
        .contains(&RecalcNote::PossibleDependencyCycle { passes: 5 }));
}

#[test]
fn test_zero_pass_cap_still_orders_dependencies() {
    let first = task(1, 1, "Set budget");
    let mut second = task(2, 1, "Book venue");
    second.depends_on = vec![TaskId(1)];

    let outcome = recalculate(&twelve_month_request(vec![first, second]).with_max_dependency_passes(0));
    assert_eq!(outcome.due_date_for(TaskId(1)), Some(d(2026, 11, 2)));
    assert_eq!(outcome.due_date_for(TaskId(2)), Some(d(2026, 11, 3)));
    assert!(!outcome
        .notes
        .iter()
        .any(|n| matches!(n, RecalcNote::PossibleDependencyCycle { .. })));
}

#[test]
fn test_ignoring_locks_moves_locked_tasks() {
    let mut locked = task(1, 1, "Locked");
    locked.locked = true;
    locked.due_date = Some(d(2027, 3, 1));

    let outcome = recalculate(&twelve_month_request(vec![locked]).with_respect_locks(false));
    assert_eq!(outcome.skipped_locked_count, 0);
    assert_eq!(outcome.due_date_for(TaskId(1)), Some(d(2026, 10, 19)));
    assert_eq!(outcome.updated_count, 1);
}
