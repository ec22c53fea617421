//! Day membership queries.

use crate::model::task::TaskRecord;
use chrono::NaiveDate;
use serde::Serialize;

/// Partition of a task set by placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleSplit<'a> {
    /// Tasks with `time_block_start` or `scheduled_time`.
    pub scheduled: Vec<&'a TaskRecord>,
    /// Pooled tasks: they belong to the day but have no placement.
    pub unscheduled: Vec<&'a TaskRecord>,
}

/// Returns the non-template tasks belonging to `date`, in input order.
///
/// A task belongs to `date` when any of `scheduled_date`, `planned_day` or
/// the date part of `time_block_start` equals it.
pub fn tasks_for_date(tasks: &[TaskRecord], date: NaiveDate) -> Vec<&TaskRecord> {
    tasks.iter().filter(|task| task.belongs_to(date)).collect()
}

/// `tasks_for_date` restricted to incomplete tasks.
pub fn incomplete_tasks_for_date(tasks: &[TaskRecord], date: NaiveDate) -> Vec<&TaskRecord> {
    tasks
        .iter()
        .filter(|task| !task.is_completed && task.belongs_to(date))
        .collect()
}

/// Partitions `tasks` by presence of a placement time.
///
/// Every input task lands in exactly one side; relative order is kept on both.
pub fn separate_scheduled<'a, I>(tasks: I) -> ScheduleSplit<'a>
where
    I: IntoIterator<Item = &'a TaskRecord>,
{
    let (scheduled, unscheduled): (Vec<_>, Vec<_>) = tasks
        .into_iter()
        .partition(|task| task.is_scheduled());
    ScheduleSplit {
        scheduled,
        unscheduled,
    }
}
