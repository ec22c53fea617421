//! Canonical task model shared by every scheduling component.
//!
//! # Responsibility
//! - Define the `TaskRecord` shape exchanged with the persistence collaborator.
//! - Define recurrence rule value types carried by recurring templates.
//! - Decode loosely-typed date/time fields without failing the whole record.
//!
//! # Invariants
//! - Every task is identified by a stable, non-nil `TaskId`.
//! - Absent or malformed date fields are represented as `None`, never as errors.
//! - Recurring templates are data only; they are never scheduled themselves.

pub(crate) mod decode;
pub mod exceptions;
pub mod rule;
pub mod task;
