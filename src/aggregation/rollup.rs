//! Hourly and product breakdowns, and their rollup across scopes.
//!
//! A [`Rollup`] walks every record and item of a worksheet once, keying
//! planned and actual output by work hour and by (product, process). Rollups
//! of workers merge into groups, groups into teams, and so on up to the
//! office, with efficiency recomputed from the summed values at each level.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Worksheet;
use crate::schedule::coefficient_for;

use super::{OutputTotals, planned_capacity, record_actual};

/// One point of the hourly series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    /// The work hour.
    pub work_hour: u32,
    /// Totals for that hour across the scope.
    #[serde(flatten)]
    pub totals: OutputTotals,
}

/// One point of the product/process series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPoint {
    /// The product.
    pub product_id: String,
    /// The process.
    pub process_id: String,
    /// Totals for the pairing across the scope.
    #[serde(flatten)]
    pub totals: OutputTotals,
}

/// Chart-ready summary of a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Totals of the scope.
    pub totals: OutputTotals,
    /// Per-hour series, ordered by hour.
    pub hourly: Vec<HourlyPoint>,
    /// Per product/process series, ordered by product then process.
    pub products: Vec<ProductPoint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Bucket {
    planned: Decimal,
    actual: u64,
}

impl Bucket {
    fn add(&mut self, planned: Decimal, actual: u64) {
        self.planned += planned;
        self.actual += actual;
    }

    fn totals(&self) -> OutputTotals {
        OutputTotals::new(self.planned, self.actual)
    }
}

/// Accumulates planned and actual output across any number of worksheets.
#[derive(Debug, Clone, Default)]
pub struct Rollup {
    total: Bucket,
    hourly: BTreeMap<u32, Bucket>,
    products: BTreeMap<(String, String), Bucket>,
}

impl Rollup {
    /// Creates an empty rollup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rollup of a single worksheet.
    pub fn of(worksheet: &Worksheet) -> Self {
        let mut rollup = Self::new();
        rollup.add_worksheet(worksheet);
        rollup
    }

    /// Adds every record and item of a worksheet.
    pub fn add_worksheet(&mut self, worksheet: &Worksheet) {
        for record in &worksheet.records {
            let planned = planned_capacity(record, worksheet);
            let actual = record_actual(record);
            self.total.add(planned, actual);
            self.hourly.entry(record.work_hour).or_default().add(planned, actual);

            if record.items.is_empty() {
                self.products
                    .entry((worksheet.product_id.clone(), worksheet.process_id.clone()))
                    .or_default()
                    .add(planned, 0);
                continue;
            }
            let coefficient = coefficient_for(worksheet.shift_type, record.work_hour);
            for item in &record.items {
                self.products
                    .entry((item.product_id.clone(), item.process_id.clone()))
                    .or_default()
                    .add(
                        Decimal::from(item.planned_output) * coefficient,
                        u64::from(item.actual_output),
                    );
            }
        }
    }

    /// Merges a child scope into this one.
    pub fn merge(&mut self, child: &Rollup) {
        self.total.add(child.total.planned, child.total.actual);
        for (hour, bucket) in &child.hourly {
            self.hourly.entry(*hour).or_default().add(bucket.planned, bucket.actual);
        }
        for (key, bucket) in &child.products {
            self.products
                .entry(key.clone())
                .or_default()
                .add(bucket.planned, bucket.actual);
        }
    }

    /// Totals of everything added so far.
    pub fn totals(&self) -> OutputTotals {
        self.total.totals()
    }

    /// Builds the chart-ready summary.
    pub fn summary(&self) -> Summary {
        Summary {
            totals: self.totals(),
            hourly: self
                .hourly
                .iter()
                .map(|(hour, bucket)| HourlyPoint {
                    work_hour: *hour,
                    totals: bucket.totals(),
                })
                .collect(),
            products: self
                .products
                .iter()
                .map(|((product_id, process_id), bucket)| ProductPoint {
                    product_id: product_id.clone(),
                    process_id: process_id.clone(),
                    totals: bucket.totals(),
                })
                .collect(),
        }
    }
}
