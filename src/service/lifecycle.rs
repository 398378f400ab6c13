//! Worksheet creation, shift changes, completion, archiving and removal.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregation::{Rollup, Summary};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Actor, ChangeKind, NewWorksheet, ResizeOutcome, Worker, Worksheet, WorksheetStatus,
};
use crate::schedule::ShiftType;
use crate::store::{Change, Stamp};

use super::{WorksheetService, ensure_editable};

/// Which workers a create call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorksheetScope {
    /// Every active member of the group.
    Group(String),
    /// An explicit list of workers.
    Workers(Vec<String>),
}

/// Input of [`WorksheetService::create_worksheets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWorksheets {
    /// The targeted workers.
    pub scope: WorksheetScope,
    /// The production date.
    pub date: NaiveDate,
    /// The shift every worker runs.
    pub shift_type: ShiftType,
    /// Default product.
    pub product_id: String,
    /// Default process.
    pub process_id: String,
    /// Hourly target, must be positive.
    pub planned_output_per_hour: u32,
}

/// Fields a group-wide bulk update may change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BulkUpdate {
    /// The production date.
    pub date: NaiveDate,
    /// New shift type; resizes every worksheet.
    #[serde(default)]
    pub shift_type: Option<ShiftType>,
    /// New hourly target.
    #[serde(default)]
    pub planned_output: Option<u32>,
    /// New default product.
    #[serde(default)]
    pub product_id: Option<String>,
    /// New default process.
    #[serde(default)]
    pub process_id: Option<String>,
}

/// Result of a bulk update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateOutcome {
    /// Number of worksheets written.
    pub updated: usize,
    /// Resize results, one per worksheet whose shift changed.
    pub resizes: Vec<ResizeOutcome>,
}

/// A worksheet with its computed summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetView {
    /// The stored worksheet.
    #[serde(flatten)]
    pub worksheet: Worksheet,
    /// Totals and breakdowns.
    pub summary: Summary,
}

impl From<Worksheet> for WorksheetView {
    fn from(worksheet: Worksheet) -> Self {
        let summary = Rollup::of(&worksheet).summary();
        Self { worksheet, summary }
    }
}

impl WorksheetService {
    /// Creates one worksheet per targeted worker, atomically.
    ///
    /// Fails with a conflict if any worker already has a worksheet that day;
    /// nothing is created in that case.
    pub async fn create_worksheets(&self, actor: &Actor, input: CreateWorksheets) -> EngineResult<Vec<Worksheet>> {
        let started = Instant::now();
        if input.planned_output_per_hour == 0 {
            return Err(EngineError::validation(
                "plannedOutput",
                "must be greater than zero",
            ));
        }
        self.ensure_pairing(&input.product_id, &input.process_id).await?;

        let workers = self.resolve_scope(actor, &input.scope).await?;
        let worker_ids: Vec<String> = workers.iter().map(|w| w.id.clone()).collect();

        let existing = self.store.existing_workers(&worker_ids, input.date).await?;
        if !existing.is_empty() {
            return Err(EngineError::conflict(format!(
                "worksheets already exist on {} for: {}",
                input.date,
                existing.join(", ")
            )));
        }

        let now = Utc::now();
        let mut changes = Vec::with_capacity(workers.len());
        for worker in &workers {
            let group_id = worker.group_id.clone().unwrap_or_default();
            let office_id = self.directory.office_of_group(&group_id).await?;
            changes.push(Change::Insert(Worksheet::open(
                NewWorksheet {
                    worker_id: worker.id.clone(),
                    group_id,
                    office_id,
                    date: input.date,
                    shift_type: input.shift_type,
                    product_id: input.product_id.clone(),
                    process_id: input.process_id.clone(),
                    planned_output_per_hour: input.planned_output_per_hour,
                    created_by_id: actor.id.clone(),
                },
                self.utc_offset,
                now,
            )));
        }

        let created = self.store.commit(changes).await?;

        info!(
            actor_id = %actor.id,
            date = %input.date,
            shift_type = %input.shift_type,
            created = created.len(),
            duration_us = started.elapsed().as_micros(),
            "Worksheets created"
        );
        for (group_id, count) in count_by_group(&created) {
            self.publish(&group_id, input.date, None, count, ChangeKind::Created);
        }
        Ok(created)
    }

    /// Expands the scope to workers and checks the actor may act on each.
    async fn resolve_scope(&self, actor: &Actor, scope: &WorksheetScope) -> EngineResult<Vec<Worker>> {
        match scope {
            WorksheetScope::Group(group_id) => {
                let group = self.group(group_id).await?;
                self.authorize_group(actor, &group)?;
                let members = self.directory.active_members(group_id).await;
                if members.is_empty() {
                    return Err(EngineError::validation(
                        "groupId",
                        format!("group {} has no active members", group_id),
                    ));
                }
                Ok(members)
            }
            WorksheetScope::Workers(worker_ids) => {
                if worker_ids.is_empty() {
                    return Err(EngineError::validation("workerIds", "must not be empty"));
                }
                let mut seen = HashSet::new();
                let mut workers = Vec::with_capacity(worker_ids.len());
                for worker_id in worker_ids {
                    if !seen.insert(worker_id.as_str()) {
                        return Err(EngineError::validation(
                            "workerIds",
                            format!("worker {} listed twice", worker_id),
                        ));
                    }
                    let worker = self
                        .directory
                        .user(worker_id)
                        .await
                        .filter(|w| w.active)
                        .ok_or_else(|| EngineError::not_found("worker", worker_id))?;
                    let group_id = worker.group_id.clone().ok_or_else(|| {
                        EngineError::bad_request(format!("worker {} has no group", worker_id))
                    })?;
                    let group = self.group(&group_id).await?;
                    self.authorize_group(actor, &group)?;
                    workers.push(worker);
                }
                Ok(workers)
            }
        }
    }

    /// Loads a worksheet with its summary.
    pub async fn get_worksheet(&self, worksheet_id: Uuid) -> EngineResult<WorksheetView> {
        Ok(self.load(worksheet_id).await?.into())
    }

    /// Switches one worksheet to a new shift type.
    ///
    /// Shrinking deletes the surplus hours and their items; the outcome lists
    /// which deleted hours had reported output so callers can warn about it.
    pub async fn resize_for_shift_change(
        &self,
        actor: &Actor,
        worksheet_id: Uuid,
        shift_type: ShiftType,
    ) -> EngineResult<ResizeOutcome> {
        let mut worksheet = self.load_for_edit(worksheet_id, actor).await?;
        if worksheet.shift_type == shift_type {
            return Ok(ResizeOutcome {
                worksheet_id,
                ..ResizeOutcome::default()
            });
        }

        let expected = Stamp::of(&worksheet);
        let outcome = worksheet.resize(shift_type, self.utc_offset, Utc::now());
        let (group_id, date) = (worksheet.group_id.clone(), worksheet.date);
        self.store
            .commit(vec![Change::Replace { worksheet, expected }])
            .await?;

        log_resize(&outcome, shift_type);
        self.publish(&group_id, date, None, 1, ChangeKind::Resized);
        Ok(outcome)
    }

    /// Applies shift type and default changes to every worksheet of a group
    /// for one date, in a single commit.
    pub async fn bulk_update_group(
        &self,
        actor: &Actor,
        group_id: &str,
        update: BulkUpdate,
    ) -> EngineResult<BulkUpdateOutcome> {
        let group = self.group(group_id).await?;
        self.authorize_group(actor, &group)?;
        if update.planned_output == Some(0) {
            return Err(EngineError::validation(
                "plannedOutput",
                "must be greater than zero",
            ));
        }

        let worksheets = self.store.find_by_group_date(group_id, update.date).await?;
        if worksheets.is_empty() {
            return Err(EngineError::not_found(
                "worksheets",
                format!("group {} on {}", group_id, update.date),
            ));
        }

        let now = Utc::now();
        let mut changes = Vec::with_capacity(worksheets.len());
        let mut resizes = Vec::new();
        for mut worksheet in worksheets {
            ensure_editable(&worksheet)?;
            let expected = Stamp::of(&worksheet);

            let product_id = update.product_id.as_deref().unwrap_or(&worksheet.product_id);
            let process_id = update.process_id.as_deref().unwrap_or(&worksheet.process_id);
            if update.product_id.is_some() || update.process_id.is_some() {
                self.ensure_pairing(product_id, process_id).await?;
            }

            let mut changed = worksheet.update_defaults(
                update.product_id.as_deref(),
                update.process_id.as_deref(),
                update.planned_output,
                now,
            );
            if let Some(shift_type) = update.shift_type.filter(|s| *s != worksheet.shift_type) {
                let outcome = worksheet.resize(shift_type, self.utc_offset, now);
                log_resize(&outcome, shift_type);
                resizes.push(outcome);
                changed = true;
            }
            if changed {
                changes.push(Change::Replace { worksheet, expected });
            }
        }

        let updated = self.store.commit(changes).await?.len();
        info!(
            actor_id = %actor.id,
            group_id = %group_id,
            date = %update.date,
            updated,
            resized = resizes.len(),
            "Group worksheets updated"
        );
        if updated > 0 {
            let change = if resizes.is_empty() {
                ChangeKind::DefaultsUpdated
            } else {
                ChangeKind::Resized
            };
            self.publish(group_id, update.date, None, updated, change);
        }
        Ok(BulkUpdateOutcome { updated, resizes })
    }

    /// Marks an active worksheet as completed.
    pub async fn complete(&self, actor: &Actor, worksheet_id: Uuid) -> EngineResult<Worksheet> {
        let mut worksheet = self.load_for_edit(worksheet_id, actor).await?;
        if worksheet.status != WorksheetStatus::Active {
            return Err(EngineError::bad_request(format!(
                "worksheet {} is not active",
                worksheet_id
            )));
        }

        let expected = Stamp::of(&worksheet);
        worksheet.status = WorksheetStatus::Completed;
        worksheet.updated_at = Utc::now();
        let mut stored = self
            .store
            .commit(vec![Change::Replace { worksheet, expected }])
            .await?;
        let worksheet = stored
            .pop()
            .ok_or_else(|| EngineError::not_found("worksheet", worksheet_id))?;

        info!(actor_id = %actor.id, worksheet_id = %worksheet_id, "Worksheet completed");
        self.publish(&worksheet.group_id, worksheet.date, None, 1, ChangeKind::Completed);
        Ok(worksheet)
    }

    /// Archives every unarchived worksheet older than the retention window.
    ///
    /// Returns how many worksheets were archived.
    pub async fn archive_expired(&self, actor: &Actor, today: NaiveDate) -> EngineResult<usize> {
        self.authorize_admin(actor)?;
        let cutoff = today
            .checked_sub_days(Days::new(u64::from(self.archive_after_days)))
            .ok_or_else(|| EngineError::validation("today", "date out of range"))?;

        let now = Utc::now();
        let changes: Vec<Change> = self
            .store
            .find_unarchived_before(cutoff)
            .await?
            .into_iter()
            .map(|mut worksheet| {
                let expected = Stamp::of(&worksheet);
                worksheet.status = WorksheetStatus::Archived;
                worksheet.updated_at = now;
                Change::Replace { worksheet, expected }
            })
            .collect();
        if changes.is_empty() {
            return Ok(0);
        }

        let archived = self.store.commit(changes).await?;
        info!(cutoff = %cutoff, archived = archived.len(), "Expired worksheets archived");
        let mut scopes: Vec<(String, NaiveDate)> = archived
            .iter()
            .map(|ws| (ws.group_id.clone(), ws.date))
            .collect();
        scopes.sort();
        scopes.dedup();
        for (group_id, date) in scopes {
            let count = archived
                .iter()
                .filter(|ws| ws.group_id == group_id && ws.date == date)
                .count();
            self.publish(&group_id, date, None, count, ChangeKind::Archived);
        }
        Ok(archived.len())
    }

    /// Hard-deletes a worksheet with its records and items. Admin only.
    pub async fn remove(&self, actor: &Actor, worksheet_id: Uuid) -> EngineResult<()> {
        self.authorize_admin(actor)?;
        let worksheet = self.load(worksheet_id).await?;
        self.store
            .commit(vec![Change::Delete {
                worksheet_id,
                expected_version: worksheet.version,
            }])
            .await?;

        info!(actor_id = %actor.id, worksheet_id = %worksheet_id, "Worksheet removed");
        self.publish(&worksheet.group_id, worksheet.date, None, 1, ChangeKind::Removed);
        Ok(())
    }
}

fn log_resize(outcome: &ResizeOutcome, shift_type: ShiftType) {
    if outcome.lost_output() {
        warn!(
            worksheet_id = %outcome.worksheet_id,
            shift_type = %shift_type,
            hours = ?outcome.removed_hours_with_output,
            "Shift change deleted hours with reported output"
        );
    } else {
        info!(
            worksheet_id = %outcome.worksheet_id,
            shift_type = %shift_type,
            added = ?outcome.added_hours,
            removed = ?outcome.removed_hours,
            retimed = ?outcome.retimed_hours,
            "Worksheet resized"
        );
    }
}

fn count_by_group(worksheets: &[Worksheet]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for worksheet in worksheets {
        match counts.iter_mut().find(|(group_id, _)| *group_id == worksheet.group_id) {
            Some((_, count)) => *count += 1,
            None => counts.push((worksheet.group_id.clone(), 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OutputEntry, RecordStatus, Role};
    use crate::service::test_support::{admin, create_for_group, date, harness, leader};
    use crate::service::{HourBatch, WorkerOutput};

    fn output(worker_id: &str, actual: u32) -> WorkerOutput {
        WorkerOutput {
            worker_id: worker_id.to_string(),
            entries: vec![OutputEntry {
                product_id: "prod_shirt".to_string(),
                process_id: "proc_collar".to_string(),
                planned_output: None,
                actual_output: actual,
                note: None,
            }],
            expected_version: None,
        }
    }

    #[tokio::test]
    async fn test_create_for_group_covers_active_members() {
        let h = harness();
        let created = h
            .service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();

        assert_eq!(created.len(), 4);
        for worksheet in &created {
            assert_eq!(worksheet.records.len(), 8);
            assert_eq!(worksheet.office_id, "office_hn");
            assert!(worksheet.records.iter().all(|r| r.status == RecordStatus::Pending));
        }
        let events = h.publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].affected_workers, 4);
        assert_eq!(events[0].change, ChangeKind::Created);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates_without_partial_writes() {
        let h = harness();
        let mut single = create_for_group(ShiftType::Normal);
        single.scope = WorksheetScope::Workers(vec!["worker_a1_2".to_string()]);
        h.service.create_worksheets(&leader(), single).await.unwrap();

        let result = h
            .service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await;

        match result {
            Err(EngineError::Conflict { message }) => assert!(message.contains("worker_a1_2")),
            other => panic!("Expected Conflict, got {:?}", other),
        }
        let stored = h.service.store().find_by_date(date()).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_pairing() {
        let h = harness();
        let mut input = create_for_group(ShiftType::Normal);
        input.process_id = "proc_hem".to_string();
        let result = h.service.create_worksheets(&leader(), input).await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_zero_target() {
        let h = harness();
        let mut input = create_for_group(ShiftType::Normal);
        input.planned_output_per_hour = 0;
        let result = h.service.create_worksheets(&leader(), input).await;
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_by_other_groups_leader_is_denied() {
        let h = harness();
        let other_leader = Actor::new("leader_a2", Role::GroupLeader);
        let result = h
            .service
            .create_worksheets(&other_leader, create_for_group(ShiftType::Normal))
            .await;
        assert!(matches!(result, Err(EngineError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn test_create_for_unknown_worker_is_not_found() {
        let h = harness();
        let mut input = create_for_group(ShiftType::Normal);
        input.scope = WorksheetScope::Workers(vec!["ghost".to_string()]);
        let result = h.service.create_worksheets(&admin(), input).await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resize_grow_adds_only_missing_hour() {
        let h = harness();
        let created = h
            .service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();
        let target = created.iter().find(|w| w.worker_id == "worker_a1_1").unwrap();
        h.service
            .batch_update_hour(
                &leader(),
                HourBatch {
                    group_id: "group_a1".to_string(),
                    work_hour: 2,
                    date: date(),
                    outputs: vec![output("worker_a1_1", 170)],
                },
            )
            .await
            .unwrap();
        let before = h.service.get_worksheet(target.id).await.unwrap().worksheet;

        let outcome = h
            .service
            .resize_for_shift_change(&leader(), target.id, ShiftType::Extended)
            .await
            .unwrap();

        assert_eq!(outcome.added_hours, vec![9]);
        let after = h.service.get_worksheet(target.id).await.unwrap().worksheet;
        assert_eq!(after.records.len(), 9);
        assert_eq!(&after.records[..8], before.records.as_slice());
        assert_eq!(after.record(2).unwrap().status, RecordStatus::Completed);
        assert_eq!(after.record(9).unwrap().status, RecordStatus::Pending);
    }

    #[tokio::test]
    async fn test_bulk_update_shrinks_and_reports_lost_output() {
        let h = harness();
        h.service
            .create_worksheets(&leader(), create_for_group(ShiftType::Overtime))
            .await
            .unwrap();
        h.service
            .batch_update_hour(
                &leader(),
                HourBatch {
                    group_id: "group_a1".to_string(),
                    work_hour: 10,
                    date: date(),
                    outputs: vec![output("worker_a1_3", 90)],
                },
            )
            .await
            .unwrap();

        let outcome = h
            .service
            .bulk_update_group(
                &leader(),
                "group_a1",
                BulkUpdate {
                    date: date(),
                    shift_type: Some(ShiftType::Normal),
                    planned_output: Some(200),
                    ..BulkUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.updated, 4);
        assert_eq!(outcome.resizes.len(), 4);
        let lost: Vec<&ResizeOutcome> = outcome.resizes.iter().filter(|r| r.lost_output()).collect();
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].removed_hours_with_output, vec![10]);

        for worksheet in h.service.store().find_by_group_date("group_a1", date()).await.unwrap() {
            assert_eq!(worksheet.records.len(), 8);
            assert_eq!(worksheet.planned_output_per_hour, 200);
            assert_eq!(worksheet.record(1).unwrap().planned_output, 200);
        }
        assert_eq!(h.publisher.events().last().unwrap().change, ChangeKind::Resized);
    }

    #[tokio::test]
    async fn test_bulk_update_defaults_only_publishes_defaults_updated() {
        let h = harness();
        h.service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();

        let outcome = h
            .service
            .bulk_update_group(
                &leader(),
                "group_a1",
                BulkUpdate {
                    date: date(),
                    planned_output: Some(200),
                    ..BulkUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.updated, 4);
        assert!(outcome.resizes.is_empty());
        let event = h.publisher.events().last().cloned().unwrap();
        assert_eq!(event.change, ChangeKind::DefaultsUpdated);
        assert_eq!(event.affected_workers, 4);
    }

    #[tokio::test]
    async fn test_bulk_update_without_worksheets_is_not_found() {
        let h = harness();
        let result = h
            .service
            .bulk_update_group(
                &leader(),
                "group_a1",
                BulkUpdate {
                    date: date(),
                    shift_type: Some(ShiftType::Extended),
                    ..BulkUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_complete_then_archive_then_only_remove() {
        let h = harness();
        let created = h
            .service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();
        let id = created[0].id;

        let completed = h.service.complete(&leader(), id).await.unwrap();
        assert_eq!(completed.status, WorksheetStatus::Completed);
        assert!(matches!(
            h.service.complete(&leader(), id).await,
            Err(EngineError::BadRequest { .. })
        ));

        let later = date().checked_add_days(Days::new(31)).unwrap();
        assert!(matches!(
            h.service.archive_expired(&leader(), later).await,
            Err(EngineError::PermissionDenied { .. })
        ));
        assert_eq!(h.service.archive_expired(&admin(), later).await.unwrap(), 4);
        assert_eq!(h.service.archive_expired(&admin(), later).await.unwrap(), 0);

        assert!(matches!(
            h.service
                .resize_for_shift_change(&leader(), id, ShiftType::Extended)
                .await,
            Err(EngineError::BadRequest { .. })
        ));
        assert!(matches!(
            h.service.remove(&leader(), id).await,
            Err(EngineError::PermissionDenied { .. })
        ));
        h.service.remove(&admin(), id).await.unwrap();
        assert!(matches!(
            h.service.get_worksheet(id).await,
            Err(EngineError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_archive_keeps_recent_worksheets() {
        let h = harness();
        h.service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();
        let within_window = date().checked_add_days(Days::new(30)).unwrap();
        assert_eq!(h.service.archive_expired(&admin(), within_window).await.unwrap(), 0);
    }
}
