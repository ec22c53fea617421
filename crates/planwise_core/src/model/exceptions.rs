//! Per-occurrence exceptions stored on recurring templates.
//!
//! # Responsibility
//! - Record "this occurrence only" deletions (skipped dates) and edits
//!   (field overrides) keyed by occurrence date.
//! - Apply a field patch to a task record.
//!
//! # Invariants
//! - A date is never both skipped and overridden.
//! - Patches only touch presentation/planning fields, never identity,
//!   completion, template markers or date fields.

use super::decode;
use super::task::{ProjectId, TaskRecord};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Partial update of the fields an occurrence may override.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrencePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "decode::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_time: Option<Option<NaiveTime>>,
    #[serde(
        default,
        deserialize_with = "decode::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_minutes: Option<Option<u32>>,
    #[serde(
        default,
        deserialize_with = "decode::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub tag: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "decode::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<Option<ProjectId>>,
}

impl OccurrencePatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.scheduled_time.is_none()
            && self.estimated_minutes.is_none()
            && self.tag.is_none()
            && self.project_id.is_none()
    }

    /// Writes every set field onto `task`.
    pub fn apply_to(&self, task: &mut TaskRecord) {
        if let Some(text) = &self.text {
            task.text = text.clone();
        }
        if let Some(scheduled_time) = self.scheduled_time {
            task.scheduled_time = scheduled_time;
        }
        if let Some(estimated_minutes) = self.estimated_minutes {
            task.estimated_minutes = estimated_minutes;
        }
        if let Some(tag) = &self.tag {
            task.tag = tag.clone();
        }
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
    }

    /// Overlays `newer` onto `self`; fields set in `newer` win.
    pub fn merge(&mut self, newer: &OccurrencePatch) {
        if newer.text.is_some() {
            self.text.clone_from(&newer.text);
        }
        if newer.scheduled_time.is_some() {
            self.scheduled_time = newer.scheduled_time;
        }
        if newer.estimated_minutes.is_some() {
            self.estimated_minutes = newer.estimated_minutes;
        }
        if newer.tag.is_some() {
            self.tag.clone_from(&newer.tag);
        }
        if newer.project_id.is_some() {
            self.project_id = newer.project_id;
        }
    }

    /// Unsets every field that `other` sets, so `other` takes effect.
    pub fn clear_fields_set_by(&mut self, other: &OccurrencePatch) {
        if other.text.is_some() {
            self.text = None;
        }
        if other.scheduled_time.is_some() {
            self.scheduled_time = None;
        }
        if other.estimated_minutes.is_some() {
            self.estimated_minutes = None;
        }
        if other.tag.is_some() {
            self.tag = None;
        }
        if other.project_id.is_some() {
            self.project_id = None;
        }
    }
}

/// Skipped dates and overrides of one recurring template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesExceptions {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub skipped: BTreeSet<NaiveDate>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<NaiveDate, OccurrencePatch>,
}

impl SeriesExceptions {
    pub fn is_empty(&self) -> bool {
        self.skipped.is_empty() && self.overrides.is_empty()
    }

    pub fn is_skipped(&self, date: NaiveDate) -> bool {
        self.skipped.contains(&date)
    }

    pub fn override_for(&self, date: NaiveDate) -> Option<&OccurrencePatch> {
        self.overrides.get(&date)
    }

    /// Marks `date` as deleted, dropping any override it had.
    pub fn skip(&mut self, date: NaiveDate) {
        self.overrides.remove(&date);
        self.skipped.insert(date);
    }

    /// Merges `patch` into the override for `date`.
    pub fn override_with(&mut self, date: NaiveDate, patch: &OccurrencePatch) {
        self.overrides.entry(date).or_default().merge(patch);
    }

    /// Splits into entries strictly before `date` and entries on/after it.
    pub fn split_at(&self, date: NaiveDate) -> (SeriesExceptions, SeriesExceptions) {
        let mut before = self.clone();
        let after = SeriesExceptions {
            skipped: before.skipped.split_off(&date),
            overrides: before.overrides.split_off(&date),
        };
        (before, after)
    }

    /// Clears fields set by `patch` in every override, dropping empty ones.
    pub fn clear_overridden_fields(&mut self, patch: &OccurrencePatch) {
        for existing in self.overrides.values_mut() {
            existing.clear_fields_set_by(patch);
        }
        self.overrides.retain(|_, existing| !existing.is_empty());
    }
}
