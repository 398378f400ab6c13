//! Change events published after every mutating operation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Channel name dashboards subscribe to.
pub const WORKSHEET_UPDATED: &str = "worksheet:updated";

/// What kind of mutation produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Worksheets were created.
    Created,
    /// One hour was reported for a group.
    BatchUpdated,
    /// The shift type changed.
    Resized,
    /// Worksheet defaults changed without a shift change.
    DefaultsUpdated,
    /// An hour's target was adjusted.
    TargetAdjusted,
    /// An hour's entries were copied forward.
    CopiedForward,
    /// A worksheet was completed.
    Completed,
    /// Worksheets were archived.
    Archived,
    /// A worksheet was deleted.
    Removed,
}

/// Payload of the `worksheet:updated` channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetUpdated {
    /// The affected group.
    pub group_id: String,
    /// The affected production date.
    pub date: NaiveDate,
    /// The affected hour, for hour-scoped changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_hour: Option<u32>,
    /// How many workers' sheets changed.
    pub affected_workers: usize,
    /// The kind of change.
    pub change: ChangeKind,
    /// When the change was committed.
    pub occurred_at: DateTime<Utc>,
}
