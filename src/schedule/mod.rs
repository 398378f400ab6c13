//! Shift schedule table.
//!
//! Turns a shift type into its ordered, non-uniform list of work-hour slots:
//! the four morning hours, the lunch gap, the four afternoon hours and then
//! whatever extension the shift type adds. Slot offsets are wall-clock
//! times in the factory's local offset; [`HourSlot::absolute_range`] combines
//! them with a worksheet date to get UTC timestamps.

mod shift_type;
mod slots;

pub use shift_type::ShiftType;
pub use slots::{HourSlot, ShiftSchedule, coefficient_for, schedule_for};
