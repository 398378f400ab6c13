//! Organization output report.
//!
//! The report lists every active worker in scope, whether or not they have a
//! worksheet for the date, and rolls their output up through
//! Office → Department → Team → Group → Worker. Each level carries the same
//! chart-ready [`Summary`].

mod builder;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregation::Summary;
use crate::models::WorksheetStatus;
use crate::schedule::ShiftType;

pub use builder::ReportBuilder;

/// Date and optional hierarchy filter of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    /// The production date.
    pub date: NaiveDate,
    /// Restrict to one office.
    #[serde(default)]
    pub office_id: Option<String>,
    /// Restrict to one department.
    #[serde(default)]
    pub department_id: Option<String>,
    /// Restrict to one team.
    #[serde(default)]
    pub team_id: Option<String>,
    /// Restrict to one group.
    #[serde(default)]
    pub group_id: Option<String>,
}

/// One worker line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerReport {
    /// The worker.
    pub worker_id: String,
    /// Display name.
    pub worker_name: String,
    /// Employee code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_code: Option<String>,
    /// False for the placeholder of a worker without a worksheet.
    pub has_worksheet: bool,
    /// The worksheet, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worksheet_id: Option<Uuid>,
    /// The worksheet's shift.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_type: Option<ShiftType>,
    /// The worksheet's status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorksheetStatus>,
    /// Zero totals and empty series for placeholders.
    pub summary: Summary,
}

/// Totals of a hierarchy node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStats {
    /// Active workers in scope.
    pub worker_count: usize,
    /// Of which have a worksheet.
    pub worksheet_count: usize,
    /// Output rolled up from the workers.
    pub summary: Summary,
}

/// A group and its workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    /// Group id.
    pub group_id: String,
    /// Group name.
    pub group_name: String,
    /// Rolled up totals.
    #[serde(flatten)]
    pub stats: NodeStats,
    /// Workers ordered by id.
    pub workers: Vec<WorkerReport>,
}

/// A team and its groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamReport {
    /// Team id.
    pub team_id: String,
    /// Team name.
    pub team_name: String,
    /// Rolled up totals.
    #[serde(flatten)]
    pub stats: NodeStats,
    /// Groups in directory order.
    pub groups: Vec<GroupReport>,
}

/// A department and its teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentReport {
    /// Department id.
    pub department_id: String,
    /// Department name.
    pub department_name: String,
    /// Rolled up totals.
    #[serde(flatten)]
    pub stats: NodeStats,
    /// Teams in directory order.
    pub teams: Vec<TeamReport>,
}

/// An office and its departments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeReport {
    /// Office id.
    pub office_id: String,
    /// Office name.
    pub office_name: String,
    /// Rolled up totals.
    #[serde(flatten)]
    pub stats: NodeStats,
    /// Departments in directory order.
    pub departments: Vec<DepartmentReport>,
}

/// The full report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationReport {
    /// The query the report answers.
    pub query: ReportQuery,
    /// Totals across every office in scope.
    #[serde(flatten)]
    pub stats: NodeStats,
    /// Offices in directory order.
    pub offices: Vec<OfficeReport>,
    /// Display names of the products in the product series.
    pub product_names: BTreeMap<String, String>,
    /// Display names of the processes in the product series.
    pub process_names: BTreeMap<String, String>,
}
