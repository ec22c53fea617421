//! Outbound analytics ingestion.

use crate::accuracy::report::TimeAccuracyReport;
use crate::risk::classify::RiskSummary;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Payload handed to the analytics collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    TimeAccuracy { report: TimeAccuracyReport },
    RiskSnapshot { today: NaiveDate, summary: RiskSummary },
}

impl AnalyticsEvent {
    /// Stable event name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TimeAccuracy { .. } => "time_accuracy",
            Self::RiskSnapshot { .. } => "risk_snapshot",
        }
    }
}

/// Analytics ingestion failure.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("analytics sink rejected `{event}`: {reason}")]
    Rejected { event: &'static str, reason: String },
}

/// Receives computed metrics; delivery and retries belong to the implementor.
pub trait AnalyticsSink {
    fn ingest(&mut self, event: &AnalyticsEvent) -> Result<(), SinkError>;
}

/// Sink that keeps every ingested event in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSink {
    events: Vec<AnalyticsEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[AnalyticsEvent] {
        &self.events
    }
}

impl AnalyticsSink for RecordingSink {
    fn ingest(&mut self, event: &AnalyticsEvent) -> Result<(), SinkError> {
        self.events.push(event.clone());
        Ok(())
    }
}
