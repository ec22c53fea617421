//! Planner use-case service.
//!
//! # Responsibility
//! - Run the pure scheduling engines over a snapshot read from a `TaskSource`.
//! - Persist materialized instances and series edits through the source.
//! - Hand computed metrics to an `AnalyticsSink`.
//!
//! # Invariants
//! - Service APIs never bypass `TaskSource` validation.
//! - Materialization writes only missing instances; repeating it over the
//!   same window writes nothing.
//! - Completed instances are history and are never deleted by series edits.
//!   A split series adopts the completed instances dated inside its range.

use crate::accuracy::aggregate::time_accuracy_report;
use crate::accuracy::report::TimeAccuracyReport;
use crate::config::PlannerConfig;
use crate::model::task::{TaskId, TaskRecord};
use crate::recurrence::edit::{apply_edit, EditError, EditScope, SeriesAction, SeriesChange, SeriesEdit};
use crate::recurrence::expand::{expand_all, materialize_missing, Occurrence};
use crate::recurrence::key::{DateWindow, OccurrenceKey};
use crate::risk::classify::{risk_summary, RiskSummary};
use crate::risk::overdue::overdue_tasks;
use crate::schedule::day::{day_plan, OwnedDayPlan};
use crate::source::analytics::{AnalyticsEvent, AnalyticsSink, SinkError};
use crate::source::{SourceError, TaskQuery, TaskSource};
use chrono::NaiveDate;
use log::{debug, info};
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a planner use case.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Use-case service over a task data source.
pub struct PlannerService<S: TaskSource> {
    source: S,
    config: PlannerConfig,
}

impl<S: TaskSource> PlannerService<S> {
    pub fn new(source: S, config: PlannerConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Every stored task, templates and completed tasks included.
    pub fn snapshot(&self) -> ServiceResult<Vec<TaskRecord>> {
        Ok(self.source.list_tasks(&TaskQuery::all())?)
    }

    /// Plan for `date`, with overdue carry-over when `date == today`.
    pub fn day_plan(&self, date: NaiveDate, today: NaiveDate) -> ServiceResult<OwnedDayPlan> {
        let tasks = self.snapshot()?;
        let plan = day_plan(&tasks, date, today).to_owned_plan();
        debug!(
            "event=day_plan module=service status=ok date={} tasks={}",
            date,
            plan.scheduled.len() + plan.unscheduled.len() + plan.carried_over.len()
        );
        Ok(plan)
    }

    /// Open tasks dated before `today`, in source order.
    pub fn overdue(&self, today: NaiveDate) -> ServiceResult<Vec<TaskRecord>> {
        let tasks = self.source.list_tasks(&TaskQuery {
            include_completed: false,
            include_templates: false,
            parent: None,
        })?;
        Ok(overdue_tasks(&tasks, today).into_iter().cloned().collect())
    }

    pub fn risk_summary(&self, today: NaiveDate) -> ServiceResult<RiskSummary> {
        let tasks = self.snapshot()?;
        Ok(risk_summary(&tasks, today, self.config.at_risk_window_days))
    }

    /// Occurrences of every stored template inside `window`, without writing.
    pub fn expand(&self, window: DateWindow) -> ServiceResult<Vec<Occurrence>> {
        let tasks = self.snapshot()?;
        Ok(expand_all(
            &tasks,
            window,
            self.config.max_occurrences_per_expansion,
        ))
    }

    /// Persists the instances of every template inside `window` that the
    /// source does not hold yet. Returns the ids written.
    pub fn materialize_recurring(&mut self, window: DateWindow) -> ServiceResult<Vec<TaskId>> {
        let tasks = self.snapshot()?;
        let mut written = Vec::new();
        for template in tasks.iter().filter(|task| task.is_recurring_parent) {
            let missing = materialize_missing(
                template,
                window,
                &tasks,
                self.config.max_occurrences_per_expansion,
            );
            for instance in missing {
                self.source.upsert_task(&instance)?;
                written.push(instance.id);
            }
        }

        info!(
            "event=materialize_recurring module=service status=ok from={} to={} written={}",
            window.from,
            window.to,
            written.len()
        );
        Ok(written)
    }

    /// Applies a resolved edit and persists every affected record.
    ///
    /// # Contract
    /// - The template is rewritten, split into head and tail, or removed as
    ///   described by the returned `SeriesChange`.
    /// - `ThisOnly`: the persisted instance of the key, if any, is patched or
    ///   deleted.
    /// - `AllFuture`: open instances of the template dated on or after the key
    ///   date are deleted so the next materialization rebuilds them; completed
    ///   ones are re-parented to the successor template, if any.
    /// - Writes are not atomic. Instances are written first, then the tail,
    ///   then the head (or the template delete). The source template stays
    ///   unchanged until the last write, so after a source error the same
    ///   edit can be retried and converges to the same records.
    pub fn apply_series_edit(&mut self, edit: &SeriesEdit) -> ServiceResult<SeriesChange> {
        let template_id = edit.key.template_id;
        let template = self
            .source
            .get_task(template_id)?
            .ok_or(SourceError::NotFound(template_id))?;
        let change = apply_edit(&template, edit)?;

        let instances = self
            .source
            .list_tasks(&TaskQuery::instances_of(template_id))?;
        let touched = match edit.scope {
            EditScope::ThisOnly => self.update_single_instance(edit, &instances)?,
            EditScope::AllFuture => {
                let successor = change.tail.as_ref().map(|tail| tail.id);
                self.drop_future_instances(edit.key.date, successor, &instances)?
            }
        };

        if let Some(tail) = &change.tail {
            self.source.upsert_task(tail)?;
        }
        match &change.head {
            Some(head) => self.source.upsert_task(head)?,
            None => self.source.delete_task(template_id)?,
        }

        info!(
            "event=series_edit_persist module=service status=ok template_id={} scope={:?} instances={}",
            template_id, edit.scope, touched
        );
        Ok(change)
    }

    fn update_single_instance(
        &mut self,
        edit: &SeriesEdit,
        instances: &[TaskRecord],
    ) -> ServiceResult<usize> {
        let Some(instance) = find_instance(edit.key, instances) else {
            return Ok(0);
        };
        match &edit.action {
            SeriesAction::Edit(patch) => {
                let mut updated = instance.clone();
                patch.apply_to(&mut updated);
                self.source.upsert_task(&updated)?;
            }
            SeriesAction::Delete => self.source.delete_task(instance.id)?,
        }
        Ok(1)
    }

    /// Deletes open instances dated on/after `from`. Completed ones move to
    /// `successor` when the series continues, so it does not rebuild them.
    fn drop_future_instances(
        &mut self,
        from: NaiveDate,
        successor: Option<TaskId>,
        instances: &[TaskRecord],
    ) -> ServiceResult<usize> {
        let mut touched = 0;
        for instance in instances {
            let is_future = instance
                .scheduled_date
                .is_some_and(|scheduled| scheduled >= from);
            if !is_future {
                continue;
            }
            if !instance.is_completed {
                self.source.delete_task(instance.id)?;
                touched += 1;
            } else if let Some(successor) = successor {
                let mut moved = instance.clone();
                moved.parent_task_id = Some(successor);
                self.source.upsert_task(&moved)?;
                touched += 1;
            }
        }
        Ok(touched)
    }

    /// Accuracy report over every completed task in the source.
    pub fn time_accuracy(&self) -> ServiceResult<TimeAccuracyReport> {
        let tasks = self.source.list_tasks(&TaskQuery {
            include_completed: true,
            include_templates: false,
            parent: None,
        })?;
        Ok(time_accuracy_report(
            &tasks,
            self.config.accuracy_tolerance_percent,
        ))
    }

    /// Computes the accuracy report and hands it to `sink`.
    pub fn publish_time_accuracy(
        &self,
        sink: &mut impl AnalyticsSink,
    ) -> ServiceResult<TimeAccuracyReport> {
        let report = self.time_accuracy()?;
        let event = AnalyticsEvent::TimeAccuracy {
            report: report.clone(),
        };
        sink.ingest(&event)?;
        info!(
            "event=analytics_publish module=service status=ok kind={} tasks={}",
            event.name(),
            report.task_count
        );
        Ok(report)
    }

    /// Computes the risk summary for `today` and hands it to `sink`.
    pub fn publish_risk_snapshot(
        &self,
        today: NaiveDate,
        sink: &mut impl AnalyticsSink,
    ) -> ServiceResult<RiskSummary> {
        let summary = self.risk_summary(today)?;
        let event = AnalyticsEvent::RiskSnapshot { today, summary };
        sink.ingest(&event)?;
        info!(
            "event=analytics_publish module=service status=ok kind={} tasks={}",
            event.name(),
            summary.total()
        );
        Ok(summary)
    }
}

/// Persisted instance for `key`: the one carrying its deterministic id, or an
/// adopted one keyed by parent and `scheduled_date`. Siblings moved onto
/// `key.date` through `planned_day` or a time block never match.
fn find_instance(key: OccurrenceKey, instances: &[TaskRecord]) -> Option<&TaskRecord> {
    let instance_id = key.instance_id();
    instances
        .iter()
        .find(|task| task.id == instance_id)
        .or_else(|| {
            instances
                .iter()
                .find(|task| OccurrenceKey::of_instance(task) == Some(key))
        })
}

#[cfg(test)]
mod tests {
    use super::{PlannerService, ServiceError};
    use crate::config::PlannerConfig;
    use crate::model::exceptions::OccurrencePatch;
    use crate::model::rule::RecurrenceRule;
    use crate::model::task::{TaskId, TaskRecord};
    use crate::recurrence::edit::{EditError, EditPrompt, EditScope, SeriesAction};
    use crate::recurrence::key::{DateWindow, OccurrenceKey};
    use crate::source::analytics::{AnalyticsEvent, RecordingSink};
    use crate::source::memory::InMemoryTaskSource;
    use crate::source::{SourceError, SourceResult, TaskQuery, TaskSource};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service_with(tasks: Vec<TaskRecord>) -> PlannerService<InMemoryTaskSource> {
        let source = InMemoryTaskSource::from_tasks(tasks).unwrap();
        PlannerService::new(source, PlannerConfig::default())
    }

    fn january() -> DateWindow {
        DateWindow::new(date(2024, 1, 1), date(2024, 1, 22))
    }

    #[test]
    fn materialize_twice_writes_once() {
        let template =
            TaskRecord::recurring_template("review", date(2024, 1, 1), RecurrenceRule::weekly());
        let mut service = service_with(vec![template]);

        assert_eq!(service.materialize_recurring(january()).unwrap().len(), 4);
        assert!(service.materialize_recurring(january()).unwrap().is_empty());
        assert_eq!(service.source().len(), 5);
    }

    #[test]
    fn this_only_delete_removes_instance_and_stays_removed() {
        let template =
            TaskRecord::recurring_template("review", date(2024, 1, 1), RecurrenceRule::weekly());
        let template_id = template.id;
        let mut service = service_with(vec![template]);
        service.materialize_recurring(january()).unwrap();

        let key = OccurrenceKey::new(template_id, date(2024, 1, 8));
        let edit = EditPrompt::open(key, SeriesAction::Delete).choose(EditScope::ThisOnly);
        service.apply_series_edit(&edit).unwrap();

        assert!(service.source().get_task(key.instance_id()).unwrap().is_none());
        assert!(service.materialize_recurring(january()).unwrap().is_empty());
        assert_eq!(service.source().len(), 4);
    }

    #[test]
    fn this_only_edit_patches_persisted_instance() {
        let template =
            TaskRecord::recurring_template("review", date(2024, 1, 1), RecurrenceRule::weekly());
        let template_id = template.id;
        let mut service = service_with(vec![template]);
        service.materialize_recurring(january()).unwrap();

        let key = OccurrenceKey::new(template_id, date(2024, 1, 15));
        let patch = OccurrencePatch {
            text: Some("review (short)".to_string()),
            ..OccurrencePatch::default()
        };
        let edit = EditPrompt::open(key, SeriesAction::Edit(patch)).choose(EditScope::ThisOnly);
        service.apply_series_edit(&edit).unwrap();

        let instance = service.source().get_task(key.instance_id()).unwrap().unwrap();
        assert_eq!(instance.text, "review (short)");
        let other = OccurrenceKey::new(template_id, date(2024, 1, 22));
        assert_eq!(
            service.source().get_task(other.instance_id()).unwrap().unwrap().text,
            "review"
        );
    }

    #[test]
    fn all_future_edit_keeps_past_and_completed_instances() {
        let template =
            TaskRecord::recurring_template("review", date(2024, 1, 1), RecurrenceRule::weekly());
        let template_id = template.id;
        let mut service = service_with(vec![template]);
        service.materialize_recurring(january()).unwrap();

        let done_key = OccurrenceKey::new(template_id, date(2024, 1, 22));
        let mut done = service.source().get_task(done_key.instance_id()).unwrap().unwrap();
        done.complete();
        let mut source = service.into_source();
        source.upsert_task(&done).unwrap();
        let mut service = PlannerService::new(source, PlannerConfig::default());

        let key = OccurrenceKey::new(template_id, date(2024, 1, 15));
        let patch = OccurrencePatch {
            text: Some("retro".to_string()),
            ..OccurrencePatch::default()
        };
        let edit = EditPrompt::open(key, SeriesAction::Edit(patch)).choose(EditScope::AllFuture);
        let change = service.apply_series_edit(&edit).unwrap();
        let tail_id = change.tail.as_ref().map(|tail| tail.id).unwrap();

        let early = OccurrenceKey::new(template_id, date(2024, 1, 8));
        assert!(service.source().get_task(early.instance_id()).unwrap().is_some());
        assert!(service.source().get_task(key.instance_id()).unwrap().is_none());
        let adopted = service.source().get_task(done_key.instance_id()).unwrap().unwrap();
        assert_eq!(adopted.parent_task_id, Some(tail_id));
        assert!(adopted.is_completed);

        let written = service.materialize_recurring(january()).unwrap();
        assert_eq!(written.len(), 1);
        let rebuilt = service
            .source()
            .get_task(OccurrenceKey::new(tail_id, date(2024, 1, 15)).instance_id())
            .unwrap()
            .unwrap();
        assert_eq!(rebuilt.text, "retro");
        assert_eq!(rebuilt.parent_task_id, Some(tail_id));
    }

    /// Daily series with only its Jan 1 instance persisted, moved onto Jan 2
    /// through `planned_day`.
    fn daily_with_moved_first_instance() -> (PlannerService<InMemoryTaskSource>, OccurrenceKey) {
        let template =
            TaskRecord::recurring_template("journal", date(2024, 1, 1), RecurrenceRule::daily());
        let template_id = template.id;
        let mut service = service_with(vec![template]);
        service
            .materialize_recurring(DateWindow::day(date(2024, 1, 1)))
            .unwrap();

        let first = OccurrenceKey::new(template_id, date(2024, 1, 1));
        let mut source = service.into_source();
        let mut moved = source.get_task(first.instance_id()).unwrap().unwrap();
        moved.planned_day = Some(date(2024, 1, 2));
        source.upsert_task(&moved).unwrap();
        (PlannerService::new(source, PlannerConfig::default()), first)
    }

    #[test]
    fn this_only_delete_ignores_sibling_moved_onto_the_date() {
        let (mut service, first) = daily_with_moved_first_instance();
        let second = OccurrenceKey::new(first.template_id, date(2024, 1, 2));

        let edit = EditPrompt::open(second, SeriesAction::Delete).choose(EditScope::ThisOnly);
        service.apply_series_edit(&edit).unwrap();

        let kept = service.source().get_task(first.instance_id()).unwrap().unwrap();
        assert_eq!(kept.planned_day, Some(date(2024, 1, 2)));

        let written = service
            .materialize_recurring(DateWindow::new(date(2024, 1, 1), date(2024, 1, 3)))
            .unwrap();
        let third = OccurrenceKey::new(first.template_id, date(2024, 1, 3));
        assert_eq!(written, vec![third.instance_id()]);
    }

    #[test]
    fn this_only_edit_ignores_sibling_moved_onto_the_date() {
        let (mut service, first) = daily_with_moved_first_instance();
        let second = OccurrenceKey::new(first.template_id, date(2024, 1, 2));

        let patch = OccurrencePatch {
            text: Some("journal (short)".to_string()),
            ..OccurrencePatch::default()
        };
        let edit = EditPrompt::open(second, SeriesAction::Edit(patch)).choose(EditScope::ThisOnly);
        service.apply_series_edit(&edit).unwrap();

        let moved = service.source().get_task(first.instance_id()).unwrap().unwrap();
        assert_eq!(moved.text, "journal");

        let written = service
            .materialize_recurring(DateWindow::new(date(2024, 1, 2), date(2024, 1, 2)))
            .unwrap();
        assert_eq!(written, vec![second.instance_id()]);
        let rebuilt = service.source().get_task(second.instance_id()).unwrap().unwrap();
        assert_eq!(rebuilt.text, "journal (short)");
    }

    /// Source that starts failing writes once its budget is spent.
    struct FailingWrites {
        inner: InMemoryTaskSource,
        writes_left: usize,
    }

    impl FailingWrites {
        fn spend(&mut self) -> SourceResult<()> {
            if self.writes_left == 0 {
                return Err(SourceError::Backend("disk full".to_string()));
            }
            self.writes_left -= 1;
            Ok(())
        }
    }

    impl TaskSource for FailingWrites {
        fn list_tasks(&self, query: &TaskQuery) -> SourceResult<Vec<TaskRecord>> {
            self.inner.list_tasks(query)
        }

        fn get_task(&self, id: TaskId) -> SourceResult<Option<TaskRecord>> {
            self.inner.get_task(id)
        }

        fn upsert_task(&mut self, task: &TaskRecord) -> SourceResult<()> {
            self.spend()?;
            self.inner.upsert_task(task)
        }

        fn delete_task(&mut self, id: TaskId) -> SourceResult<()> {
            self.spend()?;
            self.inner.delete_task(id)
        }
    }

    #[test]
    fn interrupted_split_converges_on_retry() {
        let template =
            TaskRecord::recurring_template("review", date(2024, 1, 1), RecurrenceRule::weekly());
        let template_id = template.id;
        let mut seeded = service_with(vec![template]);
        seeded.materialize_recurring(january()).unwrap();
        let done_key = OccurrenceKey::new(template_id, date(2024, 1, 22));
        let mut done = seeded.source().get_task(done_key.instance_id()).unwrap().unwrap();
        done.complete();
        let mut inner = seeded.into_source();
        inner.upsert_task(&done).unwrap();

        let key = OccurrenceKey::new(template_id, date(2024, 1, 15));
        let patch = OccurrencePatch {
            text: Some("retro".to_string()),
            ..OccurrencePatch::default()
        };
        let edit = EditPrompt::open(key, SeriesAction::Edit(patch)).choose(EditScope::AllFuture);

        let mut clean = PlannerService::new(inner.clone(), PlannerConfig::default());
        clean.apply_series_edit(&edit).unwrap();

        let mut service = PlannerService::new(
            FailingWrites {
                inner,
                writes_left: 1,
            },
            PlannerConfig::default(),
        );
        assert!(matches!(
            service.apply_series_edit(&edit),
            Err(ServiceError::Source(SourceError::Backend(_)))
        ));
        let untouched = service.source().get_task(template_id).unwrap().unwrap();
        assert_eq!(untouched.recurrence.as_ref().and_then(|rule| rule.until), None);

        service.source.writes_left = usize::MAX;
        service.apply_series_edit(&edit).unwrap();

        let mut retried = service.source().inner.tasks().to_vec();
        let mut expected = clean.source().tasks().to_vec();
        retried.sort_by_key(|task| task.id);
        expected.sort_by_key(|task| task.id);
        assert_eq!(retried, expected);
    }

    #[test]
    fn edit_of_missing_template_is_not_found() {
        let mut service = service_with(Vec::new());
        let key = OccurrenceKey::new(Uuid::new_v4(), date(2024, 1, 1));
        let edit = EditPrompt::open(key, SeriesAction::Delete).choose(EditScope::ThisOnly);
        assert!(matches!(
            service.apply_series_edit(&edit),
            Err(ServiceError::Source(SourceError::NotFound(_)))
        ));
    }

    #[test]
    fn edit_of_plain_task_is_rejected() {
        let plain = TaskRecord::new("plain");
        let key = OccurrenceKey::new(plain.id, date(2024, 1, 1));
        let mut service = service_with(vec![plain]);
        let edit = EditPrompt::open(key, SeriesAction::Delete).choose(EditScope::AllFuture);
        assert!(matches!(
            service.apply_series_edit(&edit),
            Err(ServiceError::Edit(EditError::NotATemplate(_)))
        ));
    }

    #[test]
    fn publish_time_accuracy_sends_report_to_sink() {
        let mut done = TaskRecord::new("call");
        done.tag = Some("sales".to_string());
        done.estimated_minutes = Some(20);
        done.actual_minutes = Some(25);
        done.complete();
        let service = service_with(vec![done]);

        let mut sink = RecordingSink::new();
        let report = service.publish_time_accuracy(&mut sink).unwrap();
        assert_eq!(report.overall_accuracy_percent, Some(125.0));
        assert_eq!(
            sink.events(),
            &[AnalyticsEvent::TimeAccuracy { report }]
        );
    }

    #[test]
    fn overdue_and_risk_use_configured_window() {
        let today = date(2024, 1, 10);
        let mut stale = TaskRecord::new("stale");
        stale.scheduled_date = Some(date(2024, 1, 9));
        let mut soon = TaskRecord::new("soon");
        soon.planned_day = Some(date(2024, 1, 13));
        let source = InMemoryTaskSource::from_tasks([stale, soon]).unwrap();
        let config = PlannerConfig {
            at_risk_window_days: 3,
            ..PlannerConfig::default()
        };
        let service = PlannerService::new(source, config);

        let overdue = service.overdue(today).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].text, "stale");

        let summary = service.risk_summary(today).unwrap();
        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.at_risk, 1);

        let mut sink = RecordingSink::new();
        service.publish_risk_snapshot(today, &mut sink).unwrap();
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn day_plan_is_detached_from_source() {
        let today = date(2024, 1, 10);
        let mut task = TaskRecord::new("today");
        task.planned_day = Some(today);
        let service = service_with(vec![task]);
        let plan = service.day_plan(today, today).unwrap();
        assert_eq!(plan.unscheduled.len(), 1);
        assert_eq!(plan.unscheduled[0].text, "today");
    }
}
