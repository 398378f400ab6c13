//! Hour slot tables per shift type.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

use super::ShiftType;

/// Coefficient of the 90-minute ninth hour on an extended shift.
const EXTENDED_SLOT_COEFFICIENT: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

/// Wall-clock bounds of the eight slots every shift shares. 11:30-12:30 is lunch.
const NORMAL_SLOTS: [((u32, u32), (u32, u32)); 8] = [
    ((7, 30), (8, 30)),
    ((8, 30), (9, 30)),
    ((9, 30), (10, 30)),
    ((10, 30), (11, 30)),
    ((12, 30), (13, 30)),
    ((13, 30), (14, 30)),
    ((14, 30), (15, 30)),
    ((15, 30), (16, 30)),
];

/// The extended shift runs straight on from 16:30 for 90 minutes.
const EXTENDED_SLOT: ((u32, u32), (u32, u32)) = ((16, 30), (18, 0));

/// Overtime starts after the 16:30-17:00 afternoon break.
const OVERTIME_SLOTS: [((u32, u32), (u32, u32)); 3] = [
    ((17, 0), (18, 0)),
    ((18, 0), (19, 0)),
    ((19, 0), (20, 0)),
];

/// One scheduled production hour within a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourSlot {
    /// 1-based index of the slot within its shift.
    pub hour: u32,
    /// Local wall-clock start of the slot.
    pub start: NaiveTime,
    /// Local wall-clock end of the slot.
    pub end: NaiveTime,
    /// Multiplier applied to planned output for this slot.
    pub coefficient: Decimal,
}

impl HourSlot {
    /// Returns the real length of the slot in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Combines the slot with a worksheet date and the factory's UTC offset.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{FixedOffset, NaiveDate, Timelike};
    /// use worksheet_engine::schedule::{schedule_for, ShiftType};
    ///
    /// let schedule = schedule_for(ShiftType::Normal);
    /// let offset = FixedOffset::east_opt(7 * 3600).unwrap();
    /// let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    /// let (start, end) = schedule.slots()[0].absolute_range(date, offset);
    ///
    /// // 07:30 local at +07:00 is 00:30 UTC.
    /// assert_eq!(start.hour(), 0);
    /// assert_eq!(start.minute(), 30);
    /// assert_eq!((end - start).num_minutes(), 60);
    /// ```
    pub fn absolute_range(&self, date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
        let to_utc = |time: NaiveTime| {
            DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(time) - shift, Utc)
        };
        (to_utc(self.start), to_utc(self.end))
    }
}

/// The ordered slot list for one shift type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSchedule {
    /// The shift type the slots were derived from.
    pub shift_type: ShiftType,
    slots: Vec<HourSlot>,
}

impl ShiftSchedule {
    /// Resolves a schedule from a raw shift type code.
    ///
    /// Unknown codes fail with a configuration error instead of
    /// defaulting to a normal shift.
    pub fn for_code(code: &str) -> EngineResult<Self> {
        Ok(schedule_for(code.parse()?))
    }

    /// Returns the slots in hour order.
    pub fn slots(&self) -> &[HourSlot] {
        &self.slots
    }

    /// Returns the slot for a work hour, if the shift has it.
    pub fn slot(&self, hour: u32) -> Option<&HourSlot> {
        self.slots.iter().find(|slot| slot.hour == hour)
    }

    /// Returns true if the shift contains the work hour.
    pub fn contains(&self, hour: u32) -> bool {
        self.slot(hour).is_some()
    }

    /// Returns the highest work hour of the shift.
    pub fn max_hour(&self) -> u32 {
        self.slots.last().map(|slot| slot.hour).unwrap_or(0)
    }

    /// Returns the number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the schedule has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn time_of_day(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

fn slot(hour: u32, bounds: ((u32, u32), (u32, u32)), coefficient: Decimal) -> HourSlot {
    let ((start_h, start_m), (end_h, end_m)) = bounds;
    HourSlot {
        hour,
        start: time_of_day(start_h, start_m),
        end: time_of_day(end_h, end_m),
        coefficient,
    }
}

/// Returns the ordered hour slots for a shift type.
///
/// Hour indices are contiguous from 1. Every coefficient is 1 except the
/// ninth hour of an extended shift, which spans 90 minutes and counts 1.5.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use worksheet_engine::schedule::{schedule_for, ShiftType};
///
/// assert_eq!(schedule_for(ShiftType::Normal).len(), 8);
/// assert_eq!(schedule_for(ShiftType::Overtime).len(), 11);
///
/// let extended = schedule_for(ShiftType::Extended);
/// assert_eq!(extended.slot(9).unwrap().coefficient, Decimal::new(15, 1));
/// ```
pub fn schedule_for(shift_type: ShiftType) -> ShiftSchedule {
    let mut slots: Vec<HourSlot> = NORMAL_SLOTS
        .iter()
        .zip(1..)
        .map(|(bounds, hour)| slot(hour, *bounds, Decimal::ONE))
        .collect();

    match shift_type {
        ShiftType::Normal => {}
        ShiftType::Extended => {
            slots.push(slot(9, EXTENDED_SLOT, EXTENDED_SLOT_COEFFICIENT));
        }
        ShiftType::Overtime => {
            slots.extend(
                OVERTIME_SLOTS
                    .iter()
                    .zip(9..)
                    .map(|(bounds, hour)| slot(hour, *bounds, Decimal::ONE)),
            );
        }
    }

    ShiftSchedule { shift_type, slots }
}

/// Returns the planned-output coefficient of a work hour.
///
/// Hours outside the shift's schedule count as 1.
pub fn coefficient_for(shift_type: ShiftType, hour: u32) -> Decimal {
    if shift_type == ShiftType::Extended && hour == 9 {
        EXTENDED_SLOT_COEFFICIENT
    } else {
        Decimal::ONE
    }
}
