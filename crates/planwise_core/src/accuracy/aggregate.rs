//! Pure reducers from task sequences to accuracy reports.

use super::report::{
    EstimationTendency, ProjectTime, RecurringTaskTime, TagAccuracy, TimeAccuracyReport, UNTAGGED,
};
use crate::model::task::{ProjectId, TaskId, TaskRecord};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
struct MinuteTotals {
    task_count: usize,
    actual: u64,
    estimated: u64,
    /// Actual minutes of tasks with a non-zero estimate and a recorded actual.
    comparable_actual: u64,
    /// Estimates of those same tasks.
    comparable_estimated: u64,
}

impl MinuteTotals {
    fn push(&mut self, task: &TaskRecord) {
        let actual = task.actual_minutes.map(u64::from);
        let estimated = task.estimated_minutes.map(u64::from);

        self.task_count += 1;
        self.actual += actual.unwrap_or(0);
        self.estimated += estimated.unwrap_or(0);
        if let (Some(actual), Some(estimated)) = (actual, estimated) {
            if estimated > 0 {
                self.comparable_actual += actual;
                self.comparable_estimated += estimated;
            }
        }
    }

    fn accuracy_percent(&self) -> Option<f64> {
        ratio_percent(self.comparable_actual, self.comparable_estimated)
    }
}

/// Totals of one tag group plus the spelling shown in reports.
#[derive(Debug, Clone, Default)]
struct TagTotals {
    label: String,
    totals: MinuteTotals,
}

impl TagTotals {
    /// Keeps the smallest trimmed spelling so the label does not depend on
    /// input order ("Sales" wins over "sales").
    fn push(&mut self, label: &str, task: &TaskRecord) {
        if self.label.is_empty() || label < self.label.as_str() {
            self.label = label.to_string();
        }
        self.totals.push(task);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LineageTotals {
    instance_count: usize,
    actual_sum: u64,
    actual_samples: u64,
    estimated_sum: u64,
    estimated_samples: u64,
}

impl LineageTotals {
    fn push(&mut self, task: &TaskRecord) {
        self.instance_count += 1;
        if let Some(actual) = task.actual_minutes {
            self.actual_sum += u64::from(actual);
            self.actual_samples += 1;
        }
        if let Some(estimated) = task.estimated_minutes {
            self.estimated_sum += u64::from(estimated);
            self.estimated_samples += 1;
        }
    }
}

/// Streaming reducer over completed tasks.
///
/// Incomplete tasks and templates pushed into the accumulator are ignored, so
/// callers may feed an unfiltered snapshot.
#[derive(Debug, Clone)]
pub struct AccuracyAccumulator {
    tolerance_percent: f64,
    overall: MinuteTotals,
    /// Keyed by the case-folded tag.
    by_tag: BTreeMap<String, TagTotals>,
    by_project: BTreeMap<Option<ProjectId>, MinuteTotals>,
    by_lineage: BTreeMap<TaskId, LineageTotals>,
}

impl AccuracyAccumulator {
    /// `tolerance_percent` bounds the distance from 100 classified as accurate.
    pub fn new(tolerance_percent: f64) -> Self {
        Self {
            tolerance_percent,
            overall: MinuteTotals::default(),
            by_tag: BTreeMap::new(),
            by_project: BTreeMap::new(),
            by_lineage: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, task: &TaskRecord) {
        if !task.is_completed || task.is_recurring_parent {
            return;
        }

        self.overall.push(task);
        let label = tag_label(task.tag.as_deref());
        self.by_tag
            .entry(tag_key(label))
            .or_default()
            .push(label, task);
        self.by_project
            .entry(task.project_id)
            .or_default()
            .push(task);
        if let Some(parent_id) = task.parent_task_id {
            self.by_lineage.entry(parent_id).or_default().push(task);
        }
    }

    pub fn finish(self) -> TimeAccuracyReport {
        let by_tag: Vec<TagAccuracy> = self
            .by_tag
            .into_values()
            .map(|TagTotals { label, totals }| TagAccuracy {
                tag: label,
                task_count: totals.task_count,
                actual_minutes: totals.actual,
                estimated_minutes: totals.estimated,
                accuracy_percent: totals.accuracy_percent(),
            })
            .collect();

        let by_project = self
            .by_project
            .into_iter()
            .map(|(project_id, totals)| ProjectTime {
                project_id,
                task_count: totals.task_count,
                actual_minutes: totals.actual,
                estimated_minutes: totals.estimated,
            })
            .collect();

        let recurring = self
            .by_lineage
            .into_iter()
            .map(|(parent_task_id, totals)| RecurringTaskTime {
                parent_task_id,
                instance_count: totals.instance_count,
                average_actual_minutes: average(totals.actual_sum, totals.actual_samples),
                average_estimated_minutes: average(totals.estimated_sum, totals.estimated_samples),
            })
            .collect();

        let overall_accuracy_percent = self.overall.accuracy_percent();
        let tendency = overall_accuracy_percent
            .map(|accuracy| classify_tendency(accuracy, self.tolerance_percent));
        let (best_estimated_tag, worst_estimated_tag) = best_and_worst_tags(&by_tag);

        TimeAccuracyReport {
            task_count: self.overall.task_count,
            total_actual_minutes: self.overall.actual,
            total_estimated_minutes: self.overall.estimated,
            overall_accuracy_percent,
            tendency: tendency.map(|(tendency, _)| tendency),
            tendency_percent: tendency.map(|(_, magnitude)| magnitude),
            best_estimated_tag,
            worst_estimated_tag,
            by_tag,
            by_project,
            recurring,
        }
    }
}

/// Reduces `tasks` into a report.
pub fn time_accuracy_report<'a, I>(tasks: I, tolerance_percent: f64) -> TimeAccuracyReport
where
    I: IntoIterator<Item = &'a TaskRecord>,
{
    tasks
        .into_iter()
        .fold(AccuracyAccumulator::new(tolerance_percent), |mut acc, task| {
            acc.push(task);
            acc
        })
        .finish()
}

/// `numerator / denominator * 100`, rounded to one decimal.
pub fn ratio_percent(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(round_one_decimal(
        numerator as f64 * 100.0 / denominator as f64,
    ))
}

fn average(sum: u64, samples: u64) -> Option<f64> {
    if samples == 0 {
        return None;
    }
    Some(round_one_decimal(sum as f64 / samples as f64))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Trimmed tag as written; missing or blank tags read as `untagged`.
fn tag_label(tag: Option<&str>) -> &str {
    match tag.map(str::trim) {
        Some(tag) if !tag.is_empty() => tag,
        _ => UNTAGGED,
    }
}

/// Grouping key: tags differing only in case or surrounding space share a group.
pub(super) fn tag_key(tag: &str) -> String {
    tag.trim().to_lowercase()
}

fn classify_tendency(accuracy_percent: f64, tolerance_percent: f64) -> (EstimationTendency, f64) {
    let deviation = accuracy_percent - 100.0;
    let magnitude = round_one_decimal(deviation.abs());
    let tendency = if magnitude <= tolerance_percent {
        EstimationTendency::Accurate
    } else if deviation > 0.0 {
        EstimationTendency::Underestimate
    } else {
        EstimationTendency::Overestimate
    };
    (tendency, magnitude)
}

/// Tags closest to and furthest from 100 percent; ties go to the first tag.
fn best_and_worst_tags(tags: &[TagAccuracy]) -> (Option<String>, Option<String>) {
    let mut best: Option<(&TagAccuracy, f64)> = None;
    let mut worst: Option<(&TagAccuracy, f64)> = None;

    for entry in tags {
        let Some(accuracy) = entry.accuracy_percent else {
            continue;
        };
        let distance = (accuracy - 100.0).abs();
        if best.map_or(true, |(_, current)| distance < current) {
            best = Some((entry, distance));
        }
        if worst.map_or(true, |(_, current)| distance > current) {
            worst = Some((entry, distance));
        }
    }

    (
        best.map(|(entry, _)| entry.tag.clone()),
        worst.map(|(entry, _)| entry.tag.clone()),
    )
}
