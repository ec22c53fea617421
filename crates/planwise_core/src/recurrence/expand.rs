//! Occurrence expansion and on-demand materialization.

use super::key::{DateWindow, OccurrenceKey};
use crate::model::exceptions::SeriesExceptions;
use crate::model::task::TaskRecord;
use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;

/// One dated occurrence of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub key: OccurrenceKey,
    /// Schedulable instance with overrides applied.
    pub task: TaskRecord,
}

/// Returns the visible occurrence dates of `template` inside `window`.
///
/// Skipped dates are omitted; at most `max` dates are returned. Non-templates,
/// templates without a rule or start date, and reversed windows yield nothing.
pub fn occurrence_dates(template: &TaskRecord, window: DateWindow, max: usize) -> Vec<NaiveDate> {
    if !template.is_recurring_parent || window.is_empty() || max == 0 {
        return Vec::new();
    }
    let (Some(rule), Some(start)) = (template.recurrence.as_ref(), template.start_date()) else {
        debug!(
            "event=recurrence_expand module=recurrence status=skipped reason=missing_rule_or_start template_id={}",
            template.id
        );
        return Vec::new();
    };

    let lower = window.from.max(rule.lower_bound(start));
    let Some(mut index) = rule.first_index_on_or_after(start, lower) else {
        return Vec::new();
    };

    let mut dates = Vec::new();
    while let Some(date) = rule.slot(start, index) {
        if date > window.to {
            break;
        }
        if !template.exceptions.is_skipped(date) {
            if dates.len() == max {
                warn!(
                    "event=recurrence_expand module=recurrence status=truncated template_id={} max={}",
                    template.id, max
                );
                break;
            }
            dates.push(date);
        }
        let Some(next) = index.checked_add(1) else {
            break;
        };
        index = next;
    }
    dates
}

/// Expands `template` into dated occurrences inside `window`.
pub fn expand(template: &TaskRecord, window: DateWindow, max: usize) -> Vec<Occurrence> {
    occurrence_dates(template, window, max)
        .into_iter()
        .map(|date| Occurrence {
            key: OccurrenceKey::new(template.id, date),
            task: instantiate(template, date),
        })
        .collect()
}

/// Expands every template found in `tasks`, in input order.
pub fn expand_all(tasks: &[TaskRecord], window: DateWindow, max: usize) -> Vec<Occurrence> {
    tasks
        .iter()
        .filter(|task| task.is_recurring_parent)
        .flat_map(|template| expand(template, window, max))
        .collect()
}

/// Returns instances of `template` inside `window` that `existing` lacks.
///
/// An occurrence counts as present when an existing task carries its
/// deterministic instance id, or has the same key (parent plus
/// `scheduled_date`). An instance moved through `planned_day` or a time block
/// keeps its own slot and never hides another. Persisting the result and
/// calling again returns nothing.
pub fn materialize_missing(
    template: &TaskRecord,
    window: DateWindow,
    existing: &[TaskRecord],
    max: usize,
) -> Vec<TaskRecord> {
    let existing_ids: HashSet<_> = existing.iter().map(|task| task.id).collect();
    let existing_keys: HashSet<OccurrenceKey> =
        existing.iter().filter_map(OccurrenceKey::of_instance).collect();

    let missing: Vec<TaskRecord> = expand(template, window, max)
        .into_iter()
        .filter(|occurrence| {
            !existing_ids.contains(&occurrence.task.id)
                && !existing_keys.contains(&occurrence.key)
        })
        .map(|occurrence| occurrence.task)
        .collect();

    debug!(
        "event=recurrence_materialize module=recurrence status=ok template_id={} missing={}",
        template.id,
        missing.len()
    );
    missing
}

/// Builds the schedulable instance of `template` on `date`.
///
/// The instance copies planning fields, lands on `date` (time blocks keep
/// their time of day), references the template, starts incomplete and then
/// receives the date's override, if any.
pub fn instantiate(template: &TaskRecord, date: NaiveDate) -> TaskRecord {
    let key = OccurrenceKey::new(template.id, date);
    let mut instance = TaskRecord::unchecked(key.instance_id(), template.text.clone());
    instance.scheduled_date = Some(date);
    instance.time_block_start = template
        .time_block_start
        .map(|start| date.and_time(start.time()));
    instance.scheduled_time = template.scheduled_time;
    instance.parent_task_id = Some(template.id);
    instance.estimated_minutes = template.estimated_minutes;
    instance.tag.clone_from(&template.tag);
    instance.project_id = template.project_id;
    instance.exceptions = SeriesExceptions::default();

    if let Some(patch) = template.exceptions.override_for(date) {
        patch.apply_to(&mut instance);
    }
    instance
}

#[cfg(test)]
mod tests {
    use super::{expand, expand_all, instantiate, materialize_missing, occurrence_dates};
    use crate::model::exceptions::OccurrencePatch;
    use crate::model::rule::RecurrenceRule;
    use crate::model::task::TaskRecord;
    use crate::recurrence::key::DateWindow;
    use chrono::{NaiveDate, NaiveTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january() -> DateWindow {
        DateWindow::new(date(2024, 1, 1), date(2024, 1, 31))
    }

    #[test]
    fn window_starting_mid_series_skips_earlier_slots() {
        let template =
            TaskRecord::recurring_template("water plants", date(2024, 1, 1), RecurrenceRule::daily().every(3));
        let window = DateWindow::new(date(2024, 1, 5), date(2024, 1, 12));
        assert_eq!(
            occurrence_dates(&template, window, 100),
            vec![date(2024, 1, 7), date(2024, 1, 10)]
        );
    }

    #[test]
    fn skipped_dates_are_omitted_and_not_counted_against_max() {
        let mut template =
            TaskRecord::recurring_template("gym", date(2024, 1, 1), RecurrenceRule::weekly());
        template.exceptions.skip(date(2024, 1, 8));
        assert_eq!(
            occurrence_dates(&template, january(), 3),
            vec![date(2024, 1, 1), date(2024, 1, 15), date(2024, 1, 22)]
        );
    }

    #[test]
    fn non_templates_and_reversed_windows_expand_to_nothing() {
        let mut plain = TaskRecord::new("plain");
        plain.scheduled_date = Some(date(2024, 1, 1));
        plain.recurrence = Some(RecurrenceRule::daily());
        assert!(expand(&plain, january(), 10).is_empty());

        let template =
            TaskRecord::recurring_template("t", date(2024, 1, 1), RecurrenceRule::daily());
        let reversed = DateWindow::new(date(2024, 1, 31), date(2024, 1, 1));
        assert!(expand(&template, reversed, 10).is_empty());
    }

    #[test]
    fn instances_carry_template_fields_and_overrides() {
        let mut template =
            TaskRecord::recurring_template("standup", date(2024, 1, 1), RecurrenceRule::daily());
        template.time_block_start = date(2024, 1, 1).and_hms_opt(9, 15, 0);
        template.estimated_minutes = Some(15);
        template.tag = Some("team".to_string());
        template.exceptions.override_with(
            date(2024, 1, 3),
            &OccurrencePatch {
                text: Some("standup (demo day)".to_string()),
                ..OccurrencePatch::default()
            },
        );

        let regular = instantiate(&template, date(2024, 1, 2));
        assert_eq!(regular.parent_task_id, Some(template.id));
        assert!(!regular.is_recurring_parent);
        assert!(regular.recurrence.is_none());
        assert_eq!(regular.scheduled_date, Some(date(2024, 1, 2)));
        assert_eq!(
            regular.time_block_start.map(|start| start.time()),
            NaiveTime::from_hms_opt(9, 15, 0)
        );
        assert_eq!(regular.time_block_start.map(|start| start.date()), Some(date(2024, 1, 2)));
        assert_eq!(regular.text, "standup");

        let overridden = instantiate(&template, date(2024, 1, 3));
        assert_eq!(overridden.text, "standup (demo day)");
        assert_eq!(overridden.estimated_minutes, Some(15));
    }

    #[test]
    fn expand_all_only_expands_templates() {
        let template =
            TaskRecord::recurring_template("weekly", date(2024, 1, 1), RecurrenceRule::weekly());
        let mut plain = TaskRecord::new("one-off");
        plain.scheduled_date = Some(date(2024, 1, 2));
        let tasks = vec![plain, template];
        assert_eq!(expand_all(&tasks, january(), 100).len(), 5);
    }

    #[test]
    fn materialize_missing_is_idempotent() {
        let template =
            TaskRecord::recurring_template("review", date(2024, 1, 1), RecurrenceRule::weekly());
        let mut store = vec![template.clone()];

        let first = materialize_missing(&template, january(), &store, 100);
        assert_eq!(first.len(), 5);
        store.extend(first);

        let second = materialize_missing(&template, january(), &store, 100);
        assert!(second.is_empty());
    }

    #[test]
    fn materialize_missing_respects_moved_instances() {
        let template =
            TaskRecord::recurring_template("review", date(2024, 1, 1), RecurrenceRule::weekly());
        let mut moved = instantiate(&template, date(2024, 1, 8));
        moved.scheduled_date = Some(date(2024, 1, 9));
        let store = vec![template.clone(), moved];

        let missing = materialize_missing(&template, january(), &store, 100);
        let dates: Vec<_> = missing.iter().filter_map(|task| task.scheduled_date).collect();
        assert!(!dates.contains(&date(2024, 1, 8)));
        assert_eq!(dates.len(), 4);
    }

    #[test]
    fn instance_moved_by_time_block_does_not_hide_the_next_slot() {
        let template =
            TaskRecord::recurring_template("journal", date(2024, 1, 1), RecurrenceRule::daily());
        let mut moved = instantiate(&template, date(2024, 1, 1));
        moved.time_block_start = date(2024, 1, 2).and_hms_opt(9, 0, 0);
        let store = vec![template.clone(), moved];

        let window = DateWindow::new(date(2024, 1, 2), date(2024, 1, 3));
        let missing = materialize_missing(&template, window, &store, 100);
        let dates: Vec<_> = missing.iter().filter_map(|task| task.scheduled_date).collect();
        assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 3)]);
    }

    #[test]
    fn adopted_instance_with_foreign_id_holds_its_key() {
        let template =
            TaskRecord::recurring_template("review", date(2024, 1, 1), RecurrenceRule::weekly());
        let mut adopted = TaskRecord::new("review");
        adopted.parent_task_id = Some(template.id);
        adopted.scheduled_date = Some(date(2024, 1, 15));
        adopted.complete();
        let store = vec![template.clone(), adopted];

        let missing = materialize_missing(&template, january(), &store, 100);
        let dates: Vec<_> = missing.iter().filter_map(|task| task.scheduled_date).collect();
        assert!(!dates.contains(&date(2024, 1, 15)));
        assert_eq!(dates.len(), 4);
    }
}
