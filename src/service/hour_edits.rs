//! Single-worksheet hour edits: target adjustment and copy-forward.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Actor, ChangeKind, WorksheetRecord};
use crate::store::Change;

use super::WorksheetService;

/// Copies one hour's entries into a range of later or earlier hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CopyForward {
    /// The hour whose entries are copied.
    pub from_hour: u32,
    /// First target hour, inclusive.
    pub to_hour_start: u32,
    /// Last target hour, inclusive.
    pub to_hour_end: u32,
}

impl WorksheetService {
    /// Sets the planned output of one hour, rebalancing its entries.
    pub async fn adjust_target(
        &self,
        actor: &Actor,
        worksheet_id: Uuid,
        work_hour: u32,
        planned_output: u32,
    ) -> EngineResult<WorksheetRecord> {
        if planned_output == 0 {
            return Err(EngineError::validation(
                "plannedOutput",
                "must be greater than zero",
            ));
        }
        let worksheet = self.load_for_edit(worksheet_id, actor).await?;
        let mut record = worksheet
            .record(work_hour)
            .cloned()
            .ok_or_else(|| EngineError::not_found("work hour", work_hour))?;
        let previous = record.planned_output;
        record.set_planned(planned_output, &actor.id, Utc::now());

        let stored = self
            .store
            .commit(vec![Change::Records {
                worksheet_id,
                records: vec![record],
            }])
            .await?;
        let record = stored
            .iter()
            .find_map(|ws| ws.record(work_hour).cloned())
            .ok_or_else(|| EngineError::not_found("work hour", work_hour))?;

        info!(
            actor_id = %actor.id,
            worksheet_id = %worksheet_id,
            work_hour,
            previous,
            planned_output,
            "Hour target adjusted"
        );
        self.publish(
            &worksheet.group_id,
            worksheet.date,
            Some(work_hour),
            1,
            ChangeKind::TargetAdjusted,
        );
        Ok(record)
    }

    /// Copies the entries of `from_hour` into every hour of the target range.
    ///
    /// Copies keep product, process, planned share and note; actual output is
    /// reset to zero. Record status is left as it was.
    pub async fn copy_forward(
        &self,
        actor: &Actor,
        worksheet_id: Uuid,
        copy: CopyForward,
    ) -> EngineResult<Vec<WorksheetRecord>> {
        if copy.to_hour_start > copy.to_hour_end {
            return Err(EngineError::bad_request(format!(
                "target range {}..={} is reversed",
                copy.to_hour_start, copy.to_hour_end
            )));
        }
        if (copy.to_hour_start..=copy.to_hour_end).contains(&copy.from_hour) {
            return Err(EngineError::bad_request(format!(
                "target range {}..={} contains source hour {}",
                copy.to_hour_start, copy.to_hour_end, copy.from_hour
            )));
        }

        let worksheet = self.load_for_edit(worksheet_id, actor).await?;
        let source = worksheet.record(copy.from_hour).ok_or_else(|| {
            EngineError::bad_request(format!("source hour {} is not scheduled", copy.from_hour))
        })?;
        if source.items.is_empty() {
            return Err(EngineError::bad_request(format!(
                "source hour {} has no entries",
                copy.from_hour
            )));
        }

        let now = Utc::now();
        let mut targets = Vec::new();
        for hour in copy.to_hour_start..=copy.to_hour_end {
            let mut record = worksheet.record(hour).cloned().ok_or_else(|| {
                EngineError::bad_request(format!("target hour {} is not scheduled", hour))
            })?;
            record.copy_items_from(&source.items, &actor.id, now);
            targets.push(record);
        }

        let stored = self
            .store
            .commit(vec![Change::Records {
                worksheet_id,
                records: targets,
            }])
            .await?;
        let records: Vec<WorksheetRecord> = stored
            .iter()
            .flat_map(|ws| ws.records.iter())
            .filter(|r| (copy.to_hour_start..=copy.to_hour_end).contains(&r.work_hour))
            .cloned()
            .collect();

        info!(
            actor_id = %actor.id,
            worksheet_id = %worksheet_id,
            from_hour = copy.from_hour,
            to_hour_start = copy.to_hour_start,
            to_hour_end = copy.to_hour_end,
            "Hour entries copied forward"
        );
        self.publish(
            &worksheet.group_id,
            worksheet.date,
            None,
            1,
            ChangeKind::CopiedForward,
        );
        Ok(records)
    }
}
