//! "This occurrence only" vs "this and all future" edit semantics.
//!
//! # Responsibility
//! - Model the edit/delete decision as an explicit prompt that must be
//!   resolved to a scope or cancelled.
//! - Apply a resolved edit to a recurring template, producing the templates
//!   the caller must persist.
//!
//! # Invariants
//! - There is no default scope; an unresolved prompt changes nothing.
//! - `ThisOnly` touches exactly one occurrence key.
//! - `AllFuture` anchored at `d` leaves every occurrence before `d` as it was.
//! - Applying the same edit twice yields the same templates (split successor
//!   ids are derived from the anchor key).

use super::key::OccurrenceKey;
use crate::model::exceptions::OccurrencePatch;
use crate::model::task::{TaskId, TaskRecord};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// How far an edit on a recurring occurrence reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditScope {
    ThisOnly,
    AllFuture,
}

/// What the user asked to do with the occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "patch", rename_all = "snake_case")]
pub enum SeriesAction {
    Edit(OccurrencePatch),
    Delete,
}

/// Lifecycle of one edit/delete decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    Prompting,
    AppliedSingle,
    AppliedSeries,
}

/// Pending decision on a recurring occurrence.
///
/// Consumed by either `choose` or `cancel`, so a prompt cannot be resolved
/// twice or fall through to an implicit scope.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a prompt must be resolved with `choose` or `cancel`"]
pub struct EditPrompt {
    key: OccurrenceKey,
    action: SeriesAction,
}

impl EditPrompt {
    pub fn open(key: OccurrenceKey, action: SeriesAction) -> Self {
        Self { key, action }
    }

    pub fn key(&self) -> OccurrenceKey {
        self.key
    }

    pub fn action(&self) -> &SeriesAction {
        &self.action
    }

    pub fn state(&self) -> EditState {
        EditState::Prompting
    }

    /// Resolves the prompt to the given scope.
    pub fn choose(self, scope: EditScope) -> SeriesEdit {
        SeriesEdit {
            key: self.key,
            scope,
            action: self.action,
        }
    }

    /// Drops the pending action without side effects.
    pub fn cancel(self) {}
}

/// Edit whose scope has been chosen explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEdit {
    pub key: OccurrenceKey,
    pub scope: EditScope,
    pub action: SeriesAction,
}

impl SeriesEdit {
    pub fn state(&self) -> EditState {
        match self.scope {
            EditScope::ThisOnly => EditState::AppliedSingle,
            EditScope::AllFuture => EditState::AppliedSeries,
        }
    }
}

/// Templates produced by applying a `SeriesEdit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesChange {
    pub key: OccurrenceKey,
    pub scope: EditScope,
    /// The edited template. `None` when no occurrence remains and the
    /// template should be removed.
    pub head: Option<TaskRecord>,
    /// Successor template covering occurrences from `key.date` on, created by
    /// an "all future" edit that is not anchored at the first occurrence.
    pub tail: Option<TaskRecord>,
}

impl SeriesChange {
    /// Whether materialized instances dated on/after `key.date` are stale.
    pub fn invalidates_future_instances(&self) -> bool {
        self.scope == EditScope::AllFuture
    }
}

/// Reasons an edit cannot be applied to a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("task {0} is not a recurring template")]
    NotATemplate(TaskId),
    #[error("edit targets template {actual}, expected {expected}")]
    TemplateMismatch { expected: TaskId, actual: TaskId },
    #[error("{date} is not an occurrence of template {template_id}")]
    NotAnOccurrence { template_id: TaskId, date: NaiveDate },
    #[error("occurrence {date} of template {template_id} was already deleted")]
    OccurrenceDeleted { template_id: TaskId, date: NaiveDate },
}

/// Applies `edit` to `template`.
///
/// # Errors
/// - `NotATemplate` when `template` has no recurrence rule or start date.
/// - `TemplateMismatch` when the edit key names another template.
/// - `NotAnOccurrence` when the key date is not a visible slot.
/// - `OccurrenceDeleted` when the key date was skipped earlier.
pub fn apply_edit(template: &TaskRecord, edit: &SeriesEdit) -> Result<SeriesChange, EditError> {
    if edit.key.template_id != template.id {
        return Err(EditError::TemplateMismatch {
            expected: template.id,
            actual: edit.key.template_id,
        });
    }
    let (rule, start) = match (
        template.is_recurring_parent,
        template.recurrence.as_ref(),
        template.start_date(),
    ) {
        (true, Some(rule), Some(start)) => (rule, start),
        _ => return Err(EditError::NotATemplate(template.id)),
    };

    let date = edit.key.date;
    let index = rule
        .slot_index_of(start, date)
        .ok_or(EditError::NotAnOccurrence {
            template_id: template.id,
            date,
        })?;
    if template.exceptions.is_skipped(date) {
        return Err(EditError::OccurrenceDeleted {
            template_id: template.id,
            date,
        });
    }
    let is_first = rule.first_visible_index(start) == Some(index);

    let change = match (edit.scope, &edit.action) {
        (EditScope::ThisOnly, SeriesAction::Edit(patch)) => {
            let mut head = template.clone();
            head.exceptions.override_with(date, patch);
            single(edit, head)
        }
        (EditScope::ThisOnly, SeriesAction::Delete) => {
            let mut head = template.clone();
            head.exceptions.skip(date);
            single(edit, head)
        }
        (EditScope::AllFuture, SeriesAction::Edit(patch)) if is_first => {
            let mut head = template.clone();
            patch.apply_to(&mut head);
            head.exceptions.clear_overridden_fields(patch);
            series(edit, Some(head), None)
        }
        (EditScope::AllFuture, SeriesAction::Delete) if is_first => series(edit, None, None),
        (EditScope::AllFuture, SeriesAction::Edit(patch)) => {
            let mut tail = successor(template, date);
            patch.apply_to(&mut tail);
            tail.exceptions.clear_overridden_fields(patch);
            series(edit, Some(truncate_before(template, date)), Some(tail))
        }
        (EditScope::AllFuture, SeriesAction::Delete) => {
            series(edit, Some(truncate_before(template, date)), None)
        }
    };

    info!(
        "event=series_edit module=recurrence status=ok template_id={} scope={:?} has_head={} has_tail={}",
        template.id,
        edit.scope,
        change.head.is_some(),
        change.tail.is_some()
    );
    Ok(change)
}

fn single(edit: &SeriesEdit, head: TaskRecord) -> SeriesChange {
    series(edit, Some(head), None)
}

fn series(edit: &SeriesEdit, head: Option<TaskRecord>, tail: Option<TaskRecord>) -> SeriesChange {
    SeriesChange {
        key: edit.key,
        scope: edit.scope,
        head,
        tail,
    }
}

/// Ends the series the day before `date`, keeping earlier exceptions.
fn truncate_before(template: &TaskRecord, date: NaiveDate) -> TaskRecord {
    let mut head = template.clone();
    if let Some(rule) = head.recurrence.as_mut() {
        let day_before = date.pred_opt().unwrap_or(date);
        rule.until = Some(rule.until.map_or(day_before, |until| until.min(day_before)));
    }
    let (before, _) = template.exceptions.split_at(date);
    head.exceptions = before;
    head
}

/// New template covering slots from `date` on, with the original anchor.
fn successor(template: &TaskRecord, date: NaiveDate) -> TaskRecord {
    let mut tail = template.clone();
    tail.id = successor_id(template.id, date);
    if let Some(rule) = tail.recurrence.as_mut() {
        rule.starts_from = Some(date);
    }
    let (_, on_or_after) = template.exceptions.split_at(date);
    tail.exceptions = on_or_after;
    tail
}

fn successor_id(template_id: TaskId, date: NaiveDate) -> TaskId {
    let name = format!("series-split:{}", date.format("%Y-%m-%d"));
    Uuid::new_v5(&template_id, name.as_bytes())
}
