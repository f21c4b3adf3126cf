//! Global dependency-consistency pass.
//!
//! Raises movable tasks until every dependency edge satisfies
//! `due(task) >= due(dependency) + 1 day`, or the pass cap is reached.

use chrono::NaiveDate;
use log::warn;
use std::collections::{HashMap, HashSet};

use crate::models::{shift_days, Task, TaskId};

/// Default iteration cap of the fixed-point pass.
pub const DEFAULT_MAX_DEPENDENCY_PASSES: usize = 100;

/// Outcome of the dependency pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
    /// Passes executed, including the final one that found nothing to change
    pub passes: usize,
    /// False when the cap was hit with a movable edge still violated
    pub converged: bool,
    /// Edges `(task, dependency)` where the task is fixed and due too early
    pub pinned_violations: Vec<(TaskId, TaskId)>,
}

fn has_movable_violation(
    dependents: &[&Task],
    dates: &HashMap<TaskId, NaiveDate>,
    movable: &HashSet<TaskId>,
) -> bool {
    dependents
        .iter()
        .filter(|t| movable.contains(&t.id))
        .any(|task| {
            let Some(due) = dates.get(&task.id) else {
                return false;
            };
            task.depends_on
                .iter()
                .filter_map(|dep| dates.get(dep))
                .any(|dep_due| *due < shift_days(*dep_due, 1))
        })
}

/// Enforce dependency ordering over `dates`.
///
/// Only tasks in `movable` are raised; every other dated task is a fixed
/// point. References to tasks without a date are ignored. Tasks are visited
/// in slice order so the result is deterministic.
pub fn enforce_dependencies(
    tasks: &[Task],
    dates: &mut HashMap<TaskId, NaiveDate>,
    movable: &HashSet<TaskId>,
    max_passes: usize,
) -> DependencyReport {
    let dependents: Vec<&Task> = tasks.iter().filter(|t| !t.depends_on.is_empty()).collect();

    // A zero cap still runs one pass
    let max_passes = max_passes.max(1);
    let mut report = DependencyReport::default();

    loop {
        let mut changed = false;
        report.passes += 1;

        for task in dependents.iter().filter(|t| movable.contains(&t.id)) {
            let Some(mut due) = dates.get(&task.id).copied() else {
                continue;
            };
            for dep in &task.depends_on {
                if let Some(dep_due) = dates.get(dep) {
                    let earliest = shift_days(*dep_due, 1);
                    if due < earliest {
                        due = earliest;
                        changed = true;
                    }
                }
            }
            dates.insert(task.id, due);
        }

        if !changed {
            report.converged = true;
            break;
        }
        if report.passes >= max_passes {
            report.converged = !has_movable_violation(&dependents, dates, movable);
            break;
        }
    }

    if !report.converged {
        warn!(
            "Dependency pass hit the cap of {} iterations; dependencies may be circular",
            max_passes
        );
    }

    for task in dependents.iter().filter(|t| !movable.contains(&t.id)) {
        let Some(due) = dates.get(&task.id) else {
            continue;
        };
        for dep in &task.depends_on {
            if let Some(dep_due) = dates.get(dep) {
                if *due < shift_days(*dep_due, 1) {
                    report.pinned_violations.push((task.id, *dep));
                }
            }
        }
    }

    report
}
