//! Recurrence rule value types.
//!
//! # Responsibility
//! - Describe a template cadence (frequency + interval) and its end condition.
//! - Map a slot index to its calendar date.
//!
//! # Invariants
//! - `interval >= 1`; `count >= 1` when set.
//! - Slot `n` is computed from the anchor date, never chained from slot `n-1`,
//!   so month-end clamping does not drift (Jan 31 -> Feb 29 -> Mar 31).
//! - `until` is inclusive; `starts_from` is an inclusive lower bound that
//!   hides earlier slots without renumbering them.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cadence unit of a recurring template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// Cadence plus optional end condition for a recurring template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Number of frequency units between two slots.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Total number of slots, skipped ones included.
    #[serde(default)]
    pub count: Option<u32>,
    /// Last date (inclusive) a slot may fall on.
    #[serde(default)]
    pub until: Option<NaiveDate>,
    /// First date (inclusive) a slot may fall on. Set on the successor of a
    /// split series so it keeps the original anchor and slot numbering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_from: Option<NaiveDate>,
}

/// Structural problems in a recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleValidationError {
    #[error("recurrence interval must be >= 1")]
    ZeroInterval,
    #[error("recurrence count must be >= 1 when set")]
    ZeroCount,
}

fn default_interval() -> u32 {
    1
}

impl RecurrenceRule {
    /// Creates an open-ended rule with interval 1.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            count: None,
            until: None,
            starts_from: None,
        }
    }

    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    pub fn weekly() -> Self {
        Self::new(Frequency::Weekly)
    }

    pub fn monthly() -> Self {
        Self::new(Frequency::Monthly)
    }

    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn until(mut self, until: NaiveDate) -> Self {
        self.until = Some(until);
        self
    }

    /// Earliest date an occurrence may fall on for a series anchored at `start`.
    pub fn lower_bound(&self, start: NaiveDate) -> NaiveDate {
        self.starts_from.map_or(start, |from| from.max(start))
    }

    /// Index of the first slot that is not hidden by `starts_from`.
    pub fn first_visible_index(&self, start: NaiveDate) -> Option<u32> {
        self.first_index_on_or_after(start, self.lower_bound(start))
    }

    /// Validates structural rule constraints.
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.interval == 0 {
            return Err(RuleValidationError::ZeroInterval);
        }
        if self.count == Some(0) {
            return Err(RuleValidationError::ZeroCount);
        }
        Ok(())
    }

    /// Returns the date of slot `index` for a series anchored at `start`.
    ///
    /// Returns `None` once the slot lies past the end condition or outside
    /// the representable calendar range.
    pub fn slot(&self, start: NaiveDate, index: u32) -> Option<NaiveDate> {
        if self.interval == 0 {
            return None;
        }
        if let Some(count) = self.count {
            if index >= count {
                return None;
            }
        }

        let steps = u64::from(index) * u64::from(self.interval);
        let date = match self.frequency {
            Frequency::Daily => start.checked_add_days(Days::new(steps))?,
            Frequency::Weekly => start.checked_add_days(Days::new(steps.checked_mul(7)?))?,
            Frequency::Monthly => {
                start.checked_add_months(Months::new(u32::try_from(steps).ok()?))?
            }
        };

        match self.until {
            Some(until) if date > until => None,
            _ => Some(date),
        }
    }

    /// Returns the slot index of `date`, or `None` when `date` is not a
    /// visible slot.
    pub fn slot_index_of(&self, start: NaiveDate, date: NaiveDate) -> Option<u32> {
        if date < self.lower_bound(start) {
            return None;
        }
        let index = self.first_index_on_or_after(start, date)?;
        (self.slot(start, index)? == date).then_some(index)
    }

    /// Returns the first slot index whose date is `>= date`.
    ///
    /// Daily and weekly cadences jump directly; monthly cadences estimate by
    /// month distance and then walk at most a couple of slots.
    pub fn first_index_on_or_after(&self, start: NaiveDate, date: NaiveDate) -> Option<u32> {
        if self.interval == 0 {
            return None;
        }
        if date <= start {
            return Some(0);
        }

        let interval = i64::from(self.interval);
        let mut index = match self.frequency {
            Frequency::Daily => div_ceil((date - start).num_days(), interval),
            Frequency::Weekly => div_ceil((date - start).num_days(), interval * 7),
            Frequency::Monthly => {
                let months = month_distance(start, date);
                (months / interval).max(0)
            }
        };

        loop {
            let index_u32 = u32::try_from(index).ok()?;
            let slot = self.slot(start, index_u32)?;
            if slot >= date {
                return Some(index_u32);
            }
            index += 1;
        }
    }
}

fn div_ceil(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1) / divisor
}

fn month_distance(from: NaiveDate, to: NaiveDate) -> i64 {
    use chrono::Datelike;

    let years = i64::from(to.year() - from.year());
    let months = i64::from(to.month()) - i64::from(from.month());
    years * 12 + months - 1
}
