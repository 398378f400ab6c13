//! Record- and worksheet-level totals.
//!
//! Actual output is always re-summed from items; the record's cached
//! `actual_output` only serves the write path. Planned output resolves the
//! legacy fallback once, in [`effective_planned`], and is then scaled by the
//! hour's coefficient.

use rust_decimal::Decimal;

use crate::models::{Worksheet, WorksheetRecord};
use crate::schedule::coefficient_for;

use super::OutputTotals;

/// Actual output of a record: the sum of its items.
pub fn record_actual(record: &WorksheetRecord) -> u64 {
    record.items_actual()
}

/// The record's planned output, falling back to the worksheet's hourly
/// target when the record carries none.
pub fn effective_planned(record: &WorksheetRecord, worksheet: &Worksheet) -> u32 {
    if record.planned_output > 0 {
        record.planned_output
    } else {
        worksheet.planned_output_per_hour
    }
}

/// Effective planned output scaled by the hour's coefficient.
pub fn planned_capacity(record: &WorksheetRecord, worksheet: &Worksheet) -> Decimal {
    Decimal::from(effective_planned(record, worksheet))
        * coefficient_for(worksheet.shift_type, record.work_hour)
}

/// Totals of a single hour.
pub fn record_totals(record: &WorksheetRecord, worksheet: &Worksheet) -> OutputTotals {
    OutputTotals::new(planned_capacity(record, worksheet), record_actual(record))
}

/// Totals of a whole worksheet.
///
/// Planned is the coefficient-weighted sum over records; actual is the plain
/// sum of item output, since the coefficient only scales capacity.
pub fn worksheet_totals(worksheet: &Worksheet) -> OutputTotals {
    let planned: Decimal = worksheet
        .records
        .iter()
        .map(|record| planned_capacity(record, worksheet))
        .sum();
    let actual: u64 = worksheet.records.iter().map(record_actual).sum();
    OutputTotals::new(planned, actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewWorksheet, OutputEntry};
    use crate::schedule::ShiftType;
    use chrono::{FixedOffset, NaiveDate, Utc};

    fn worksheet(shift_type: ShiftType, planned_per_hour: u32) -> Worksheet {
        Worksheet::open(
            NewWorksheet {
                worker_id: "w-1".to_string(),
                group_id: "g-1".to_string(),
                office_id: "o-1".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
                shift_type,
                product_id: "p-1".to_string(),
                process_id: "pr-1".to_string(),
                planned_output_per_hour: planned_per_hour,
                created_by_id: "leader".to_string(),
            },
            FixedOffset::east_opt(7 * 3600).unwrap(),
            Utc::now(),
        )
    }

    fn report(worksheet: &mut Worksheet, hour: u32, actual: u32) {
        let fallback = worksheet.planned_output_per_hour;
        worksheet.record_mut(hour).unwrap().replace_items(
            &[OutputEntry {
                product_id: "p-1".to_string(),
                process_id: "pr-1".to_string(),
                planned_output: None,
                actual_output: actual,
                note: None,
            }],
            fallback,
            "leader",
            Utc::now(),
        );
    }

    #[test]
    fn test_extended_shift_counts_hour_nine_at_one_and_a_half() {
        let worksheet = worksheet(ShiftType::Extended, 180);
        // 8 * 180 + 1.5 * 180
        assert_eq!(worksheet_totals(&worksheet).planned, Decimal::from(1710));
        assert_eq!(
            planned_capacity(worksheet.record(9).unwrap(), &worksheet),
            Decimal::from(270)
        );
    }

    #[test]
    fn test_overtime_shift_has_no_fractional_hour() {
        let worksheet = worksheet(ShiftType::Overtime, 100);
        assert_eq!(worksheet_totals(&worksheet).planned, Decimal::from(1100));
    }

    #[test]
    fn test_legacy_record_without_planned_falls_back() {
        let mut worksheet = worksheet(ShiftType::Normal, 180);
        let record = worksheet.record_mut(1).unwrap();
        record.planned_output = 0;
        record.items.clear();
        let record = worksheet.record(1).unwrap();
        assert_eq!(effective_planned(record, &worksheet), 180);
    }

    #[test]
    fn test_actual_ignores_stale_cache() {
        let mut worksheet = worksheet(ShiftType::Normal, 180);
        report(&mut worksheet, 1, 150);
        worksheet.record_mut(1).unwrap().actual_output = 9_999;

        assert_eq!(record_actual(worksheet.record(1).unwrap()), 150);
        assert_eq!(worksheet_totals(&worksheet).actual, 150);
    }

    #[test]
    fn test_single_hour_efficiency() {
        let mut worksheet = worksheet(ShiftType::Normal, 180);
        report(&mut worksheet, 1, 150);
        let totals = record_totals(worksheet.record(1).unwrap(), &worksheet);
        assert_eq!(totals.planned, Decimal::from(180));
        assert_eq!(totals.efficiency, 83);
    }

    #[test]
    fn test_coefficient_does_not_scale_actual() {
        let mut worksheet = worksheet(ShiftType::Extended, 100);
        report(&mut worksheet, 9, 150);
        let totals = record_totals(worksheet.record(9).unwrap(), &worksheet);
        assert_eq!(totals.planned, Decimal::from(150));
        assert_eq!(totals.actual, 150);
        assert_eq!(totals.efficiency, 100);
    }
}
