//! Date resolution engine.
//!
//! # Responsibility
//! - Decide day membership across the three date-bearing task fields.
//! - Split a day's tasks into scheduled (placed) and pooled (unplaced) sets.
//! - Assemble per-day plans from the resolved sets.
//!
//! # Invariants
//! - Membership is the OR-union of `scheduled_date`, `planned_day` and the
//!   date of `time_block_start`.
//! - Templates never belong to a day.
//! - Every function is pure and preserves input order unless documented.

pub mod day;
pub mod resolve;
