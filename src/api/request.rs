//! Request types for the worksheet engine API.
//!
//! Bodies are strict: unknown fields are refused so a misspelled field never
//! silently falls back to a default.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::schedule::ShiftType;
use crate::service::{CreateWorksheets, WorkerOutput, WorksheetScope};

/// Body of `POST /worksheets`.
///
/// Exactly one of `groupId` and `workerIds` must be given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateWorksheetRequest {
    /// Create for every active member of this group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Create for these workers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_ids: Option<Vec<String>>,
    /// The production date.
    pub date: NaiveDate,
    /// The shift every worker runs.
    pub shift_type: ShiftType,
    /// Default product.
    pub product_id: String,
    /// Default process.
    pub process_id: String,
    /// Hourly target.
    pub planned_output: u32,
}

impl TryFrom<CreateWorksheetRequest> for CreateWorksheets {
    type Error = EngineError;

    fn try_from(request: CreateWorksheetRequest) -> EngineResult<Self> {
        let scope = match (request.group_id, request.worker_ids) {
            (Some(group_id), None) => WorksheetScope::Group(group_id),
            (None, Some(worker_ids)) => WorksheetScope::Workers(worker_ids),
            _ => {
                return Err(EngineError::validation(
                    "groupId",
                    "exactly one of groupId and workerIds is required",
                ));
            }
        };
        Ok(CreateWorksheets {
            scope,
            date: request.date,
            shift_type: request.shift_type,
            product_id: request.product_id,
            process_id: request.process_id,
            planned_output_per_hour: request.planned_output,
        })
    }
}

/// Body of `POST /worksheets/group/{groupId}/hour/{workHour}/batch-update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BatchUpdateRequest {
    /// The production date.
    pub date: NaiveDate,
    /// One output per worker.
    pub outputs: Vec<WorkerOutput>,
}

/// Body of `PATCH /worksheets/{id}/adjust-target/{workHour}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdjustTargetRequest {
    /// The new planned output of the hour.
    pub planned_output: u32,
}

/// Body of `POST /worksheets/{id}/shift`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShiftChangeRequest {
    /// The new shift type.
    pub shift_type: ShiftType,
}

/// Body of `POST /worksheets/archive-expired`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArchiveRequest {
    /// Reference date; the factory's current date when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today: Option<NaiveDate>,
}

/// Query of `GET /worksheets/group/{groupId}/grid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridQuery {
    /// The production date.
    pub date: NaiveDate,
}
