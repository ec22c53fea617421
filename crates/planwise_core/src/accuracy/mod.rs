//! Time accuracy aggregation.
//!
//! # Responsibility
//! - Roll estimated vs actual minutes of completed tasks up per tag, per
//!   project and per recurring lineage.
//! - Derive overall accuracy, estimation tendency and best/worst tags.
//!
//! # Invariants
//! - `accuracy_percent = actual / estimated * 100`: above 100 means the work
//!   was underestimated, below 100 overestimated.
//! - Every ratio with a zero denominator is `None`, never NaN or infinity.
//! - Output order depends only on group keys, never on input order.

pub mod aggregate;
pub mod report;
