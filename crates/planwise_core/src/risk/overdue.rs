//! Overdue filtering.

use crate::model::task::TaskRecord;
use chrono::NaiveDate;

/// Returns incomplete, non-template tasks whose resolved date is strictly
/// before `before_date`, in input order.
///
/// `NaiveDate` ordering matches lexicographic ordering of the ISO
/// `YYYY-MM-DD` form, so this is the date-only string comparison.
pub fn overdue_tasks(tasks: &[TaskRecord], before_date: NaiveDate) -> Vec<&TaskRecord> {
    tasks
        .iter()
        .filter(|task| is_overdue(task, before_date))
        .collect()
}

/// Whether a single task is overdue relative to `before_date`.
pub fn is_overdue(task: &TaskRecord, before_date: NaiveDate) -> bool {
    task.is_actionable()
        && task
            .due_date()
            .is_some_and(|due_date| due_date < before_date)
}

/// Whole days between the resolved date and `today`, for overdue tasks only.
pub fn days_overdue(task: &TaskRecord, today: NaiveDate) -> Option<i64> {
    if !is_overdue(task, today) {
        return None;
    }
    task.due_date()
        .map(|due_date| (today - due_date).num_days())
}
