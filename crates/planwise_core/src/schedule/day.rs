//! Per-day plan assembly.
//!
//! # Responsibility
//! - Combine day membership, placement split and overdue carry-over into one
//!   view for a single date.
//!
//! # Invariants
//! - A task appears at most once in a plan.
//! - `scheduled` is ordered by placement time; ties keep input order.
//! - `unscheduled` keeps input order.
//! - Carry-over is only computed for the plan of `today`.

use super::resolve::{separate_scheduled, tasks_for_date};
use crate::model::task::TaskRecord;
use crate::risk::overdue::overdue_tasks;
use chrono::NaiveDate;
use serde::Serialize;

/// Resolved view of a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPlan<'a> {
    pub date: NaiveDate,
    /// Placed tasks sorted by placement time.
    pub scheduled: Vec<&'a TaskRecord>,
    /// Pooled tasks that belong to the day without a placement.
    pub unscheduled: Vec<&'a TaskRecord>,
    /// Overdue tasks from earlier days, populated only when `date == today`.
    pub carried_over: Vec<&'a TaskRecord>,
    /// Number of completed tasks among the day's members.
    pub completed_count: usize,
    /// Sum of estimates over incomplete members.
    pub planned_minutes: u64,
}

impl DayPlan<'_> {
    /// Total number of tasks shown in the plan.
    pub fn len(&self) -> usize {
        self.scheduled.len() + self.unscheduled.len() + self.carried_over.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detaches the plan from the task slice it borrows from.
    pub fn to_owned_plan(&self) -> OwnedDayPlan {
        OwnedDayPlan {
            date: self.date,
            scheduled: copy(&self.scheduled),
            unscheduled: copy(&self.unscheduled),
            carried_over: copy(&self.carried_over),
            completed_count: self.completed_count,
            planned_minutes: self.planned_minutes,
        }
    }
}

fn copy(tasks: &[&TaskRecord]) -> Vec<TaskRecord> {
    tasks.iter().map(|task| (*task).clone()).collect()
}

/// `DayPlan` holding its own task records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedDayPlan {
    pub date: NaiveDate,
    pub scheduled: Vec<TaskRecord>,
    pub unscheduled: Vec<TaskRecord>,
    pub carried_over: Vec<TaskRecord>,
    pub completed_count: usize,
    pub planned_minutes: u64,
}

/// Builds the plan for `date`, using `today` to decide carry-over.
pub fn day_plan(tasks: &[TaskRecord], date: NaiveDate, today: NaiveDate) -> DayPlan<'_> {
    let members = tasks_for_date(tasks, date);
    let completed_count = members.iter().filter(|task| task.is_completed).count();
    let planned_minutes = members
        .iter()
        .filter(|task| !task.is_completed)
        .filter_map(|task| task.estimated_minutes)
        .map(u64::from)
        .sum();

    let mut split = separate_scheduled(members);
    split.scheduled.sort_by_key(|task| task.placement_time());

    let carried_over = if date == today {
        overdue_tasks(tasks, today)
            .into_iter()
            .filter(|task| !task.belongs_to(date))
            .collect()
    } else {
        Vec::new()
    };

    DayPlan {
        date,
        scheduled: split.scheduled,
        unscheduled: split.unscheduled,
        carried_over,
        completed_count,
        planned_minutes,
    }
}
