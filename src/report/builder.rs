//! Builds the organization report from the directory and stored worksheets.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::aggregation::Rollup;
use crate::directory::Directory;
use crate::error::{EngineError, EngineResult};
use crate::models::{Group, Worksheet};
use crate::store::WorksheetStore;

use super::{
    DepartmentReport, GroupReport, NodeStats, OfficeReport, OrganizationReport, ReportQuery,
    TeamReport, WorkerReport,
};

/// Output accumulated for one node of the hierarchy.
#[derive(Debug, Default)]
struct Tally {
    rollup: Rollup,
    worker_count: usize,
    worksheet_count: usize,
}

impl Tally {
    fn absorb(&mut self, child: &Tally) {
        self.rollup.merge(&child.rollup);
        self.worker_count += child.worker_count;
        self.worksheet_count += child.worksheet_count;
    }

    fn stats(&self) -> NodeStats {
        NodeStats {
            worker_count: self.worker_count,
            worksheet_count: self.worksheet_count,
            summary: self.rollup.summary(),
        }
    }
}

/// Assembles [`OrganizationReport`]s.
#[derive(Clone)]
pub struct ReportBuilder {
    directory: Arc<dyn Directory>,
    store: Arc<dyn WorksheetStore>,
}

impl ReportBuilder {
    /// Creates a builder over the given ports.
    pub fn new(directory: Arc<dyn Directory>, store: Arc<dyn WorksheetStore>) -> Self {
        Self { directory, store }
    }

    /// Builds the report for a date and optional hierarchy filter.
    ///
    /// A filter pins every level above it: filtering by group restricts the
    /// report to that group's team, department and office. Filters that
    /// contradict each other are a validation error.
    pub async fn build(&self, query: ReportQuery) -> EngineResult<OrganizationReport> {
        let started = Instant::now();
        let scope = self.resolve_scope(&query).await?;
        let worksheets: HashMap<String, Worksheet> = self
            .store
            .find_by_date(query.date)
            .await?
            .into_iter()
            .map(|ws| (ws.worker_id.clone(), ws))
            .collect();

        let mut total = Tally::default();
        let mut offices = Vec::new();
        for office in self.directory.offices().await {
            if !matches_filter(&scope.office_id, &office.id) {
                continue;
            }
            let mut office_tally = Tally::default();
            let mut departments = Vec::new();
            for department in self.directory.departments_of(&office.id).await {
                if !matches_filter(&scope.department_id, &department.id) {
                    continue;
                }
                let mut department_tally = Tally::default();
                let mut teams = Vec::new();
                for team in self.directory.teams_of(&department.id).await {
                    if !matches_filter(&scope.team_id, &team.id) {
                        continue;
                    }
                    let mut team_tally = Tally::default();
                    let mut groups = Vec::new();
                    for group in self.directory.groups_of(&team.id).await {
                        if !matches_filter(&scope.group_id, &group.id) {
                            continue;
                        }
                        let (report, group_tally) = self.group_report(group, &worksheets).await;
                        team_tally.absorb(&group_tally);
                        groups.push(report);
                    }
                    department_tally.absorb(&team_tally);
                    teams.push(TeamReport {
                        team_id: team.id,
                        team_name: team.name,
                        stats: team_tally.stats(),
                        groups,
                    });
                }
                office_tally.absorb(&department_tally);
                departments.push(DepartmentReport {
                    department_id: department.id,
                    department_name: department.name,
                    stats: department_tally.stats(),
                    teams,
                });
            }
            total.absorb(&office_tally);
            offices.push(OfficeReport {
                office_id: office.id,
                office_name: office.name,
                stats: office_tally.stats(),
                departments,
            });
        }

        let stats = total.stats();
        let mut product_names = BTreeMap::new();
        let mut process_names = BTreeMap::new();
        for point in &stats.summary.products {
            if let Some(name) = self.directory.product_name(&point.product_id).await {
                product_names.insert(point.product_id.clone(), name);
            }
            if let Some(name) = self.directory.process_name(&point.process_id).await {
                process_names.insert(point.process_id.clone(), name);
            }
        }

        info!(
            date = %query.date,
            offices = offices.len(),
            workers = stats.worker_count,
            worksheets = stats.worksheet_count,
            duration_us = started.elapsed().as_micros(),
            "Organization report built"
        );
        Ok(OrganizationReport {
            query,
            stats,
            offices,
            product_names,
            process_names,
        })
    }

    /// Lists every active member of the group, with a placeholder for those
    /// without a worksheet.
    async fn group_report(&self, group: Group, worksheets: &HashMap<String, Worksheet>) -> (GroupReport, Tally) {
        let mut members = self.directory.active_members(&group.id).await;
        members.sort_by(|a, b| a.id.cmp(&b.id));

        let mut tally = Tally::default();
        let mut workers = Vec::with_capacity(members.len());
        for member in members {
            tally.worker_count += 1;
            let report = match worksheets.get(&member.id) {
                Some(worksheet) => {
                    let rollup = Rollup::of(worksheet);
                    tally.worksheet_count += 1;
                    tally.rollup.merge(&rollup);
                    WorkerReport {
                        worker_id: member.id,
                        worker_name: member.name,
                        worker_code: member.code,
                        has_worksheet: true,
                        worksheet_id: Some(worksheet.id),
                        shift_type: Some(worksheet.shift_type),
                        status: Some(worksheet.status),
                        summary: rollup.summary(),
                    }
                }
                None => WorkerReport {
                    worker_id: member.id,
                    worker_name: member.name,
                    worker_code: member.code,
                    has_worksheet: false,
                    worksheet_id: None,
                    shift_type: None,
                    status: None,
                    summary: Rollup::new().summary(),
                },
            };
            workers.push(report);
        }

        let report = GroupReport {
            group_id: group.id,
            group_name: group.name,
            stats: tally.stats(),
            workers,
        };
        (report, tally)
    }

    /// Completes the filter upward from its deepest level.
    async fn resolve_scope(&self, query: &ReportQuery) -> EngineResult<ReportQuery> {
        let mut scope = query.clone();
        if let Some(group_id) = query.group_id.as_deref() {
            let group = self
                .directory
                .group(group_id)
                .await
                .ok_or_else(|| EngineError::not_found("group", group_id))?;
            pin("teamId", &mut scope.team_id, group.team_id, group_id)?;
        }
        if let Some(team_id) = scope.team_id.clone() {
            let team = self
                .directory
                .team(&team_id)
                .await
                .ok_or_else(|| EngineError::not_found("team", &team_id))?;
            pin("departmentId", &mut scope.department_id, team.department_id, &team_id)?;
        }
        if let Some(department_id) = scope.department_id.clone() {
            let department = self
                .directory
                .department(&department_id)
                .await
                .ok_or_else(|| EngineError::not_found("department", &department_id))?;
            pin("officeId", &mut scope.office_id, department.office_id, &department_id)?;
        }
        if let Some(office_id) = scope.office_id.as_deref() {
            if self.directory.office(office_id).await.is_none() {
                return Err(EngineError::not_found("office", office_id));
            }
        }
        Ok(scope)
    }
}

fn matches_filter(filter: &Option<String>, id: &str) -> bool {
    filter.as_deref().is_none_or(|wanted| wanted == id)
}

/// Sets a parent filter, refusing one that contradicts an explicit value.
fn pin(field: &str, filter: &mut Option<String>, parent_id: String, child_id: &str) -> EngineResult<()> {
    match filter {
        Some(explicit) if *explicit != parent_id => Err(EngineError::validation(
            field,
            format!("{} does not belong to {}", child_id, explicit),
        )),
        _ => {
            *filter = Some(parent_id);
            Ok(())
        }
    }
}
