//! Recurrence expander.
//!
//! # Responsibility
//! - Materialize dated occurrences of recurring templates inside a window.
//! - Apply "this occurrence only" vs "this and all future" edits/deletes.
//!
//! # Invariants
//! - Every occurrence carries a stable `(template_id, date)` key.
//! - Expanding the same template over the same window yields the same keys,
//!   and materialized instance ids are derived from those keys.
//! - "All future" changes anchored at `d` never alter occurrences before `d`.
//!
//! # See also
//! - `model::rule` for slot arithmetic.
//! - `model::exceptions` for persisted per-occurrence changes.

pub mod edit;
pub mod expand;
pub mod key;
