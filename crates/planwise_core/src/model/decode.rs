//! Lenient serde decoders for task date/time fields.
//!
//! # Responsibility
//! - Turn persisted date/time values into chrono types.
//! - Map unparseable or non-string values to `None` with a `warn` event.
//!
//! # Invariants
//! - Decoding a date field never fails the enclosing record.
//! - Log events carry field kind only, never the raw value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::warn;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Text(String),
    Other(IgnoredAny),
}

/// Parses a date-only value (`YYYY-MM-DD`).
///
/// Date-time strings are accepted and truncated to their date part, since
/// some sources persist date columns as midnight timestamps.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| parse_date_time(trimmed).map(|value| value.date()))
}

/// Parses a wall-clock date-time.
///
/// RFC3339 values keep their local date and time; the offset is dropped so
/// that a block placed at 23:30 local time stays on the day it was placed.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_local());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// Parses a time of day (`HH:MM` or `HH:MM:SS`).
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
}

pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    decode_with(deserializer, "date", parse_date)
}

pub(crate) fn lenient_date_time<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    decode_with(deserializer, "date_time", parse_date_time)
}

pub(crate) fn lenient_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    decode_with(deserializer, "time", parse_time)
}

/// Marks a field as present, so an explicit `null` decodes to `Some(None)`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn decode_with<'de, D, T>(
    deserializer: D,
    kind: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawField>::deserialize(deserializer)?;
    let decoded = match raw {
        None => None,
        Some(RawField::Text(text)) if text.trim().is_empty() => None,
        Some(RawField::Text(text)) => {
            let parsed = parse(text.as_str());
            if parsed.is_none() {
                warn!("event=task_field_ignored module=model status=ignored kind={kind} reason=unparseable");
            }
            parsed
        }
        Some(RawField::Other(_)) => {
            warn!("event=task_field_ignored module=model status=ignored kind={kind} reason=not_a_string");
            None
        }
    };
    Ok(decoded)
}
