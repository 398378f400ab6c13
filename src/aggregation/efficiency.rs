//! Planned/actual totals and the efficiency ratio.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Returns `round(actual / planned * 100)`, or 0 when nothing was planned.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use worksheet_engine::aggregation::efficiency;
///
/// assert_eq!(efficiency(150, Decimal::from(100)), 150);
/// assert_eq!(efficiency(150, Decimal::from(180)), 83);
/// assert_eq!(efficiency(0, Decimal::ZERO), 0);
/// ```
pub fn efficiency(actual: u64, planned: Decimal) -> u32 {
    if planned <= Decimal::ZERO {
        return 0;
    }
    (Decimal::from(actual) * Decimal::ONE_HUNDRED / planned)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(u32::MAX)
}

/// Planned capacity, actual output and their efficiency for any scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputTotals {
    /// Planned output with hour coefficients applied.
    pub planned: Decimal,
    /// Units actually produced.
    pub actual: u64,
    /// `round(actual / planned * 100)`, 0 when nothing was planned.
    pub efficiency: u32,
}

impl Default for OutputTotals {
    fn default() -> Self {
        Self::new(Decimal::ZERO, 0)
    }
}

impl OutputTotals {
    /// Builds totals, deriving the efficiency.
    pub fn new(planned: Decimal, actual: u64) -> Self {
        let planned = planned.normalize();
        Self {
            planned,
            actual,
            efficiency: efficiency(actual, planned),
        }
    }

    /// Adds another scope's totals into this one.
    pub fn add(&mut self, other: &OutputTotals) {
        *self = OutputTotals::new(self.planned + other.planned, self.actual + other.actual);
    }
}
