//! Collaborator contracts for task storage and analytics ingestion.
//!
//! # Responsibility
//! - Define the narrow read/write interface to the task persistence layer.
//! - Define the outbound analytics ingestion interface.
//! - Provide in-memory implementations for tests and embedding callers.
//!
//! # Invariants
//! - Write paths must call `TaskRecord::validate()` before storing.
//! - Implementations never reorder tasks they return relative to insertion.

pub mod analytics;
pub mod memory;

use crate::model::task::{TaskId, TaskRecord, TaskValidationError};
use thiserror::Error;

pub type SourceResult<T> = Result<T, SourceError>;

/// Error surfaced by a task data source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error(transparent)]
    Validation(#[from] TaskValidationError),
    /// Failure inside the backing store, described without task content.
    #[error("task source backend failure: {0}")]
    Backend(String),
}

/// Filter options for listing tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub include_completed: bool,
    pub include_templates: bool,
    /// Restricts results to instances of one recurring template.
    pub parent: Option<TaskId>,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self::all()
    }
}

impl TaskQuery {
    /// Every stored task.
    pub fn all() -> Self {
        Self {
            include_completed: true,
            include_templates: true,
            parent: None,
        }
    }

    /// Materialized instances of one template, completed ones included.
    pub fn instances_of(parent: TaskId) -> Self {
        Self {
            include_completed: true,
            include_templates: false,
            parent: Some(parent),
        }
    }

    pub fn matches(&self, task: &TaskRecord) -> bool {
        if !self.include_completed && task.is_completed {
            return false;
        }
        if !self.include_templates && task.is_recurring_parent {
            return false;
        }
        match self.parent {
            Some(parent) => task.parent_task_id == Some(parent),
            None => true,
        }
    }
}

/// Read/write interface to the task persistence collaborator.
pub trait TaskSource {
    fn list_tasks(&self, query: &TaskQuery) -> SourceResult<Vec<TaskRecord>>;
    fn get_task(&self, id: TaskId) -> SourceResult<Option<TaskRecord>>;
    /// Inserts a new task or replaces the stored task with the same id.
    fn upsert_task(&mut self, task: &TaskRecord) -> SourceResult<()>;
    /// Removes a task; `NotFound` when no task has `id`.
    fn delete_task(&mut self, id: TaskId) -> SourceResult<()>;
}
