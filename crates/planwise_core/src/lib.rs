//! Core domain logic for Planwise.
//! This crate is the single source of truth for scheduling and time-accounting
//! invariants.

pub mod accuracy;
pub mod config;
pub mod logging;
pub mod model;
pub mod recurrence;
pub mod risk;
pub mod schedule;
pub mod service;
pub mod source;

pub use accuracy::aggregate::{time_accuracy_report, AccuracyAccumulator};
pub use accuracy::report::{
    EstimationTendency, ProjectTime, RecurringTaskTime, TagAccuracy, TimeAccuracyReport,
};
pub use config::{ConfigError, LoggingConfig, PlannerConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::exceptions::{OccurrencePatch, SeriesExceptions};
pub use model::rule::{Frequency, RecurrenceRule, RuleValidationError};
pub use model::task::{ProjectId, TaskId, TaskRecord, TaskValidationError};
pub use recurrence::edit::{
    apply_edit, EditError, EditPrompt, EditScope, EditState, SeriesAction, SeriesChange,
    SeriesEdit,
};
pub use recurrence::expand::{expand, expand_all, materialize_missing, Occurrence};
pub use recurrence::key::{DateWindow, OccurrenceKey};
pub use risk::classify::{classify, risk_summary, RiskStatus, RiskSummary};
pub use risk::overdue::{days_overdue, is_overdue, overdue_tasks};
pub use schedule::day::{day_plan, DayPlan, OwnedDayPlan};
pub use schedule::resolve::{
    incomplete_tasks_for_date, separate_scheduled, tasks_for_date, ScheduleSplit,
};
pub use service::planner_service::{PlannerService, ServiceError, ServiceResult};
pub use source::analytics::{AnalyticsEvent, AnalyticsSink, RecordingSink, SinkError};
pub use source::memory::InMemoryTaskSource;
pub use source::{SourceError, SourceResult, TaskQuery, TaskSource};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
