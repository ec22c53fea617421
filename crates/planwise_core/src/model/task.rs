//! TaskRecord domain model.
//!
//! # Responsibility
//! - Define the canonical task record consumed by every scheduling component.
//! - Provide date-resolution primitives (`belongs_to`, `is_scheduled`, `due_date`).
//!
//! # Invariants
//! - `id` is stable and never nil.
//! - The three date-bearing fields are independent; none is authoritative.
//! - Only `time_block_start` and `scheduled_time` make a task "scheduled".
//! - `parent_task_id` is a weak grouping reference, never ownership.

use super::decode;
use super::exceptions::SeriesExceptions;
use super::rule::{RecurrenceRule, RuleValidationError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of a task or recurring template.
pub type TaskId = Uuid;

/// Identifier of the project a task is filed under.
pub type ProjectId = Uuid;

/// Structural problems that make a task record unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    #[error("task id must not be nil")]
    NilId,
    #[error("task {0} cannot reference itself as recurring parent")]
    SelfParent(TaskId),
    #[error("recurring template {0} has no recurrence rule")]
    TemplateWithoutRule(TaskId),
    #[error("invalid recurrence rule on task {task_id}: {source}")]
    InvalidRule {
        task_id: TaskId,
        #[source]
        source: RuleValidationError,
    },
}

/// Canonical task record.
///
/// Owned by the persistence collaborator; this crate only reads it by value
/// or by reference and returns new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_completed: bool,
    /// Template marker. Templates generate occurrences and never belong to a day.
    #[serde(default)]
    pub is_recurring_parent: bool,
    #[serde(default, deserialize_with = "decode::lenient_date")]
    pub scheduled_date: Option<NaiveDate>,
    /// Alternate date-only source, kept alongside `scheduled_date`.
    #[serde(default, deserialize_with = "decode::lenient_date")]
    pub planned_day: Option<NaiveDate>,
    /// Drag-placed block start, local wall-clock time.
    #[serde(default, deserialize_with = "decode::lenient_date_time")]
    pub time_block_start: Option<NaiveDateTime>,
    /// Legacy quick-assign time without a full time block.
    #[serde(default, deserialize_with = "decode::lenient_time")]
    pub scheduled_time: Option<NaiveTime>,
    #[serde(default)]
    pub parent_task_id: Option<TaskId>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub actual_minutes: Option<u32>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Meaningful only when `is_recurring_parent` is set.
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    /// Per-occurrence deletions and overrides of a template.
    #[serde(default, skip_serializing_if = "SeriesExceptions::is_empty")]
    pub exceptions: SeriesExceptions,
}

impl TaskRecord {
    /// Creates an undated, incomplete task with a generated id.
    pub fn new(text: impl Into<String>) -> Self {
        Self::unchecked(Uuid::new_v4(), text)
    }

    /// Creates a task with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    ///
    /// # Errors
    /// - `TaskValidationError::NilId` for the nil UUID.
    pub fn with_id(id: TaskId, text: impl Into<String>) -> Result<Self, TaskValidationError> {
        if id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        Ok(Self::unchecked(id, text))
    }

    /// Creates a recurring template anchored at `start`.
    pub fn recurring_template(
        text: impl Into<String>,
        start: NaiveDate,
        rule: RecurrenceRule,
    ) -> Self {
        let mut template = Self::new(text);
        template.is_recurring_parent = true;
        template.scheduled_date = Some(start);
        template.recurrence = Some(rule);
        template
    }

    pub(crate) fn unchecked(id: TaskId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            is_completed: false,
            is_recurring_parent: false,
            scheduled_date: None,
            planned_day: None,
            time_block_start: None,
            scheduled_time: None,
            parent_task_id: None,
            estimated_minutes: None,
            actual_minutes: None,
            tag: None,
            project_id: None,
            recurrence: None,
            exceptions: SeriesExceptions::default(),
        }
    }

    /// Validates structural record constraints.
    ///
    /// Date fields are not checked: absence is valid state.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.parent_task_id == Some(self.id) {
            return Err(TaskValidationError::SelfParent(self.id));
        }
        if self.is_recurring_parent {
            let rule = self
                .recurrence
                .as_ref()
                .ok_or(TaskValidationError::TemplateWithoutRule(self.id))?;
            rule.validate()
                .map_err(|source| TaskValidationError::InvalidRule {
                    task_id: self.id,
                    source,
                })?;
        }
        Ok(())
    }

    /// Returns whether any of the three date-bearing fields resolves to `date`.
    ///
    /// Templates never belong to a date.
    pub fn belongs_to(&self, date: NaiveDate) -> bool {
        if self.is_recurring_parent {
            return false;
        }
        self.scheduled_date == Some(date)
            || self.planned_day == Some(date)
            || self.time_block_start.map(|start| start.date()) == Some(date)
    }

    /// Returns whether the task carries a placement time within its day.
    pub fn is_scheduled(&self) -> bool {
        self.time_block_start.is_some() || self.scheduled_time.is_some()
    }

    /// Placement time within the day: time-block start first, then legacy time.
    pub fn placement_time(&self) -> Option<NaiveTime> {
        self.time_block_start
            .map(|start| start.time())
            .or(self.scheduled_time)
    }

    /// Date used for overdue and risk comparisons.
    ///
    /// `scheduled_date` wins over `planned_day`; `time_block_start` is never
    /// consulted.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.scheduled_date.or(self.planned_day)
    }

    /// Anchor date of a recurring template.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.scheduled_date
            .or(self.planned_day)
            .or_else(|| self.time_block_start.map(|start| start.date()))
    }

    /// Whether the task is open, dated work (not a template, not completed).
    pub fn is_actionable(&self) -> bool {
        !self.is_completed && !self.is_recurring_parent
    }

    pub fn complete(&mut self) {
        self.is_completed = true;
    }

    pub fn reopen(&mut self) {
        self.is_completed = false;
    }
}
