//! Accuracy report records handed to presentation and analytics callers.

use super::aggregate::tag_key;
use crate::model::task::{ProjectId, TaskId};
use serde::{Deserialize, Serialize};

/// Group label used for tasks without a tag.
pub const UNTAGGED: &str = "untagged";

/// Per-tag totals and accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagAccuracy {
    pub tag: String,
    pub task_count: usize,
    pub actual_minutes: u64,
    pub estimated_minutes: u64,
    /// Computed only over tasks with a non-zero estimate and a recorded actual.
    pub accuracy_percent: Option<f64>,
}

/// Per-project totals. `project_id = None` groups unfiled tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTime {
    pub project_id: Option<ProjectId>,
    pub task_count: usize,
    pub actual_minutes: u64,
    pub estimated_minutes: u64,
}

/// Per-lineage averages for instances of one recurring template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTaskTime {
    pub parent_task_id: TaskId,
    pub instance_count: usize,
    /// Averaged over instances that recorded actual minutes.
    pub average_actual_minutes: Option<f64>,
    /// Averaged over instances that carry an estimate.
    pub average_estimated_minutes: Option<f64>,
}

/// Systematic estimation bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationTendency {
    /// Work took longer than estimated.
    Underestimate,
    /// Work took less time than estimated.
    Overestimate,
    Accurate,
}

/// Complete accuracy metrics over a set of completed tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeAccuracyReport {
    pub task_count: usize,
    pub total_actual_minutes: u64,
    pub total_estimated_minutes: u64,
    /// `None` when no estimated time was recorded anywhere.
    pub overall_accuracy_percent: Option<f64>,
    pub tendency: Option<EstimationTendency>,
    /// Distance of the overall accuracy from 100 percent.
    pub tendency_percent: Option<f64>,
    pub best_estimated_tag: Option<String>,
    pub worst_estimated_tag: Option<String>,
    /// Sorted by tag.
    pub by_tag: Vec<TagAccuracy>,
    /// Sorted by project id, unfiled first.
    pub by_project: Vec<ProjectTime>,
    /// Sorted by template id.
    pub recurring: Vec<RecurringTaskTime>,
}

impl TimeAccuracyReport {
    /// Looks a tag group up ignoring case and surrounding space.
    pub fn tag(&self, tag: &str) -> Option<&TagAccuracy> {
        let key = tag_key(tag);
        self.by_tag.iter().find(|entry| tag_key(&entry.tag) == key)
    }

    pub fn project(&self, project_id: Option<ProjectId>) -> Option<&ProjectTime> {
        self.by_project
            .iter()
            .find(|entry| entry.project_id == project_id)
    }

    pub fn lineage(&self, parent_task_id: TaskId) -> Option<&RecurringTaskTime> {
        self.recurring
            .iter()
            .find(|entry| entry.parent_task_id == parent_task_id)
    }
}
