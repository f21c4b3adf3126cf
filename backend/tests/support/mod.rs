#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Mutex;

use leadtime_planner::models::{BlockDraft, Task, TaskDraft, TimelineSnapshot};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serializes access to the process
/// environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Monday; the fixture event is exactly one year later.
pub fn today() -> NaiveDate {
    d(2026, 10, 19)
}

pub fn event_date() -> NaiveDate {
    d(2027, 10, 19)
}

/// Find a task by title.
pub fn by_title<'a>(tasks: &'a [Task], title: &str) -> &'a Task {
    tasks
        .iter()
        .find(|t| t.title == title)
        .unwrap_or_else(|| panic!("no task titled {}", title))
}

fn block(id: i64, key: &str, order: i32) -> BlockDraft {
    BlockDraft {
        id,
        key: key.to_string(),
        title: format!("{} out", key),
        order,
        is_general: false,
    }
}

fn task(id: i64, block_id: i64, title: &str) -> TaskDraft {
    TaskDraft {
        id,
        block_id,
        title: title.to_string(),
        weight: 1,
        is_skeleton: false,
        locked: false,
        due_date: None,
        depends_on: vec![],
    }
}

/// A small wedding checklist with a skeleton task, a dependency chain across
/// blocks, one locked task and one task in the general block.
pub fn wedding_snapshot(event_date: Option<NaiveDate>) -> TimelineSnapshot {
    let mut venue = task(1, 10, "Book venue");
    venue.is_skeleton = true;
    venue.weight = 5;

    let mut deposit = task(2, 10, "Pay venue deposit");
    deposit.depends_on = vec![1];

    let mut tasting = task(3, 20, "Menu tasting");
    tasting.depends_on = vec![2];

    let mut fitting = task(4, 30, "Dress fitting");
    fitting.locked = true;
    fitting.due_date = Some(d(2027, 8, 20));

    let seating = task(5, 30, "Seating chart");
    let general = task(6, 99, "Collect ideas");

    let mut general_block = block(99, "general", 10);
    general_block.is_general = true;

    TimelineSnapshot {
        title: "Wedding".to_string(),
        event_date,
        blocks: vec![
            block(10, "12m", 0),
            block(20, "8-10m", 1),
            block(30, "1-2m", 2),
            block(40, "2w", 3),
            general_block,
        ],
        tasks: vec![venue, deposit, tasting, fitting, seating, general],
    }
}
