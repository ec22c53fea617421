//! Risk status buckets for open tasks.

use super::overdue::is_overdue;
use crate::model::task::TaskRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a task stands relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    Completed,
    Overdue,
    DueToday,
    /// Due within the configured window after today.
    AtRisk,
    OnTrack,
    /// No `scheduled_date` or `planned_day`.
    Undated,
}

/// Status counts over a task collection (templates excluded).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub completed: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub at_risk: usize,
    pub on_track: usize,
    pub undated: usize,
}

impl RiskSummary {
    pub fn total(&self) -> usize {
        self.completed + self.overdue + self.due_today + self.at_risk + self.on_track + self.undated
    }

    fn record(&mut self, status: RiskStatus) {
        let slot = match status {
            RiskStatus::Completed => &mut self.completed,
            RiskStatus::Overdue => &mut self.overdue,
            RiskStatus::DueToday => &mut self.due_today,
            RiskStatus::AtRisk => &mut self.at_risk,
            RiskStatus::OnTrack => &mut self.on_track,
            RiskStatus::Undated => &mut self.undated,
        };
        *slot += 1;
    }
}

/// Classifies one non-template task.
///
/// Returns `None` for templates, which carry no status of their own.
pub fn classify(task: &TaskRecord, today: NaiveDate, at_risk_window_days: u32) -> Option<RiskStatus> {
    if task.is_recurring_parent {
        return None;
    }
    if task.is_completed {
        return Some(RiskStatus::Completed);
    }
    if is_overdue(task, today) {
        return Some(RiskStatus::Overdue);
    }

    let Some(due_date) = task.due_date() else {
        return Some(RiskStatus::Undated);
    };
    let days_until = (due_date - today).num_days();
    let status = if days_until == 0 {
        RiskStatus::DueToday
    } else if days_until <= i64::from(at_risk_window_days) {
        RiskStatus::AtRisk
    } else {
        RiskStatus::OnTrack
    };
    Some(status)
}

/// Counts statuses across `tasks`.
pub fn risk_summary(tasks: &[TaskRecord], today: NaiveDate, at_risk_window_days: u32) -> RiskSummary {
    tasks
        .iter()
        .filter_map(|task| classify(task, today, at_risk_window_days))
        .fold(RiskSummary::default(), |mut summary, status| {
            summary.record(status);
            summary
        })
}
