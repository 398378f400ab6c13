//! Aggregation logic for the worksheet engine.
//!
//! Read-side computation of planned and actual output at record, worksheet
//! and organization level. Planned output always goes through the hour
//! coefficient; actual output never does. Efficiency is derived the same way
//! at every level.

mod efficiency;
mod record;
mod rollup;

pub use efficiency::{OutputTotals, efficiency};
pub use record::{
    effective_planned, planned_capacity, record_actual, record_totals, worksheet_totals,
};
pub use rollup::{HourlyPoint, ProductPoint, Rollup, Summary};
