//! Occurrence identity and query windows.

use crate::model::task::{TaskId, TaskRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identity of one occurrence of a recurring template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccurrenceKey {
    pub template_id: TaskId,
    pub date: NaiveDate,
}

impl OccurrenceKey {
    pub fn new(template_id: TaskId, date: NaiveDate) -> Self {
        Self { template_id, date }
    }

    /// Deterministic id of the materialized instance for this key.
    ///
    /// UUIDv5 in the template id namespace, so re-materializing the same
    /// occurrence never mints a new identity.
    pub fn instance_id(&self) -> TaskId {
        let name = self.date.format("%Y-%m-%d").to_string();
        Uuid::new_v5(&self.template_id, name.as_bytes())
    }

    /// Key of an already-materialized instance.
    ///
    /// Returns `None` for tasks without a parent or without `scheduled_date`.
    pub fn of_instance(task: &TaskRecord) -> Option<Self> {
        if task.is_recurring_parent {
            return None;
        }
        Some(Self::new(task.parent_task_id?, task.scheduled_date?))
    }
}

impl Display for OccurrenceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.template_id, self.date)
    }
}

/// Inclusive date range used for expansion queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Single-day window.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// A reversed window contains no dates.
    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}
