//! The three shift kinds a worksheet can run on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Represents the shift a worker is scheduled on for one day.
///
/// # Example
///
/// ```
/// use worksheet_engine::schedule::ShiftType;
///
/// let shift: ShiftType = "EXTENDED_9_5H".parse().unwrap();
/// assert_eq!(shift, ShiftType::Extended);
/// assert_eq!(shift.code(), "EXTENDED_9_5H");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftType {
    /// Eight one-hour slots around the lunch gap.
    #[serde(rename = "NORMAL_8H")]
    Normal,
    /// The normal slots plus one 90-minute slot.
    #[serde(rename = "EXTENDED_9_5H")]
    Extended,
    /// The normal slots plus three overtime hours after the afternoon break.
    #[serde(rename = "OVERTIME_11H")]
    Overtime,
}

impl ShiftType {
    /// All known shift types.
    pub const ALL: [ShiftType; 3] = [ShiftType::Normal, ShiftType::Extended, ShiftType::Overtime];

    /// Returns the wire code of the shift type.
    pub fn code(&self) -> &'static str {
        match self {
            ShiftType::Normal => "NORMAL_8H",
            ShiftType::Extended => "EXTENDED_9_5H",
            ShiftType::Overtime => "OVERTIME_11H",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ShiftType {
    type Err = EngineError;

    /// Parses a shift type code. Unknown codes never default to a shift.
    fn from_str(s: &str) -> EngineResult<Self> {
        ShiftType::ALL
            .into_iter()
            .find(|shift| shift.code() == s)
            .ok_or_else(|| EngineError::Configuration {
                message: format!("unknown shift type '{}'", s),
            })
    }
}
