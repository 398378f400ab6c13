//! Workers × hours matrix of a group for one date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregation::{OutputTotals, Rollup, effective_planned, record_totals, worksheet_totals};
use crate::error::EngineResult;
use crate::models::{RecordStatus, WorksheetRecordItem, WorksheetStatus};
use crate::schedule::ShiftType;

use super::WorksheetService;

/// One worker-hour cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    /// The record behind the cell.
    pub record_id: Uuid,
    /// The work hour.
    pub work_hour: u32,
    /// Planned output after the legacy fallback, before the coefficient.
    pub planned_output: u32,
    /// Coefficient-weighted totals of the hour.
    #[serde(flatten)]
    pub totals: OutputTotals,
    /// Record status.
    pub status: RecordStatus,
    /// Version to echo back as `expectedVersion`.
    pub version: u64,
    /// The hour's entries.
    pub items: Vec<WorksheetRecordItem>,
}

/// One worker's row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    /// The worksheet behind the row.
    pub worksheet_id: Uuid,
    /// The worker.
    pub worker_id: String,
    /// Display name, empty if the worker left the directory.
    pub worker_name: String,
    /// The worker's shift.
    pub shift_type: ShiftType,
    /// Worksheet status.
    pub status: WorksheetStatus,
    /// Cells ordered by hour.
    pub cells: Vec<GridCell>,
    /// Totals of the whole worksheet.
    pub totals: OutputTotals,
}

/// The grid view of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupGrid {
    /// The group.
    pub group_id: String,
    /// The group's display name.
    pub group_name: String,
    /// The production date.
    pub date: NaiveDate,
    /// The highest work hour across rows.
    pub max_hour: u32,
    /// One row per worksheet, ordered by worker id.
    pub rows: Vec<GridRow>,
    /// Totals of the group.
    pub totals: OutputTotals,
}

impl WorksheetService {
    /// Builds the grid of a group's worksheets for a date.
    ///
    /// A group without worksheets yields an empty grid rather than an error.
    pub async fn group_grid(&self, group_id: &str, date: NaiveDate) -> EngineResult<GroupGrid> {
        let group = self.group(group_id).await?;
        let worksheets = self.store.find_by_group_date(group_id, date).await?;

        let mut group_rollup = Rollup::new();
        let mut rows = Vec::with_capacity(worksheets.len());
        for worksheet in &worksheets {
            group_rollup.add_worksheet(worksheet);
            let worker_name = self
                .directory
                .user(&worksheet.worker_id)
                .await
                .map(|w| w.name)
                .unwrap_or_default();
            let cells = worksheet
                .records
                .iter()
                .map(|record| GridCell {
                    record_id: record.id,
                    work_hour: record.work_hour,
                    planned_output: effective_planned(record, worksheet),
                    totals: record_totals(record, worksheet),
                    status: record.status,
                    version: record.version,
                    items: record.items.clone(),
                })
                .collect();
            rows.push(GridRow {
                worksheet_id: worksheet.id,
                worker_id: worksheet.worker_id.clone(),
                worker_name,
                shift_type: worksheet.shift_type,
                status: worksheet.status,
                cells,
                totals: worksheet_totals(worksheet),
            });
        }

        let max_hour = worksheets
            .iter()
            .filter_map(|ws| ws.records.last().map(|r| r.work_hour))
            .max()
            .unwrap_or(0);
        Ok(GroupGrid {
            group_id: group.id,
            group_name: group.name,
            date,
            max_hour,
            rows,
            totals: group_rollup.totals(),
        })
    }
}
