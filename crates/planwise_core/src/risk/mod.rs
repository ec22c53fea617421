//! Overdue and risk classification.
//!
//! # Responsibility
//! - Derive overdue state from date-only fields and completion state.
//! - Bucket open tasks by how close their resolved date is to today.
//!
//! # Invariants
//! - Comparison date is `scheduled_date`, else `planned_day`.
//! - `time_block_start` never participates in overdue decisions.
//! - Completed tasks and templates are never overdue.

pub mod classify;
pub mod overdue;
