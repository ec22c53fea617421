//! Insertion-ordered in-memory task source.

use super::{SourceError, SourceResult, TaskQuery, TaskSource};
use crate::model::task::{TaskId, TaskRecord};
use log::debug;

/// `TaskSource` backed by a `Vec`, keeping first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryTaskSource {
    tasks: Vec<TaskRecord>,
}

impl InMemoryTaskSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a source from a snapshot, validating every record.
    ///
    /// Later records replace earlier ones that share an id.
    pub fn from_tasks(tasks: impl IntoIterator<Item = TaskRecord>) -> SourceResult<Self> {
        let mut source = Self::new();
        for task in tasks {
            source.upsert_task(&task)?;
        }
        Ok(source)
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn into_tasks(self) -> Vec<TaskRecord> {
        self.tasks
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}

impl TaskSource for InMemoryTaskSource {
    fn list_tasks(&self, query: &TaskQuery) -> SourceResult<Vec<TaskRecord>> {
        Ok(self
            .tasks
            .iter()
            .filter(|task| query.matches(task))
            .cloned()
            .collect())
    }

    fn get_task(&self, id: TaskId) -> SourceResult<Option<TaskRecord>> {
        Ok(self.position(id).map(|index| self.tasks[index].clone()))
    }

    fn upsert_task(&mut self, task: &TaskRecord) -> SourceResult<()> {
        task.validate()?;
        match self.position(task.id) {
            Some(index) => self.tasks[index] = task.clone(),
            None => self.tasks.push(task.clone()),
        }
        debug!(
            "event=task_upsert module=source status=ok task_id={}",
            task.id
        );
        Ok(())
    }

    fn delete_task(&mut self, id: TaskId) -> SourceResult<()> {
        let index = self.position(id).ok_or(SourceError::NotFound(id))?;
        self.tasks.remove(index);
        debug!("event=task_delete module=source status=ok task_id={id}");
        Ok(())
    }
}
