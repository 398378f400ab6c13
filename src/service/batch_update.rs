//! Batch hourly output update.
//!
//! A group leader submits one hour of output for many workers at once. The
//! whole batch is validated up front and committed as one unit: either every
//! touched record is replaced or none is.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{Actor, ChangeKind, OutputEntry, Worksheet, WorksheetRecord};
use crate::store::Change;

use super::{WorksheetService, ensure_editable};

/// One worker's output for the hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkerOutput {
    /// The worker reporting.
    pub worker_id: String,
    /// Entries in submission order.
    pub entries: Vec<OutputEntry>,
    /// The record version the client's form was loaded with.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// A batch of output for one group, date and hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourBatch {
    /// The reporting group.
    pub group_id: String,
    /// The hour being reported.
    pub work_hour: u32,
    /// The production date.
    pub date: NaiveDate,
    /// One output per worker.
    pub outputs: Vec<WorkerOutput>,
}

/// Result of a batch update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateOutcome {
    /// The reporting group.
    pub group_id: String,
    /// The production date.
    pub date: NaiveDate,
    /// The hour that was reported.
    pub work_hour: u32,
    /// Workers whose record was replaced.
    pub updated_workers: Vec<String>,
    /// Submitted workers without a worksheet in the group.
    pub skipped_workers: Vec<String>,
    /// The stored records, in the order of `updated_workers`.
    pub records: Vec<WorksheetRecord>,
}

impl WorksheetService {
    /// Replaces one hour of output for every submitted worker of a group.
    ///
    /// Workers without a worksheet in the group are skipped. A matched
    /// worksheet lacking the hour fails the whole batch, as does a stale
    /// `expected_version`. Replaying the same batch yields the same items.
    pub async fn batch_update_hour(&self, actor: &Actor, batch: HourBatch) -> EngineResult<BatchUpdateOutcome> {
        let started = Instant::now();
        let group = self.group(&batch.group_id).await?;
        self.authorize_group(actor, &group)?;
        self.validate_outputs(&batch.outputs).await?;

        let worksheets = self.store.find_by_group_date(&batch.group_id, batch.date).await?;
        if worksheets.is_empty() {
            return Err(EngineError::not_found(
                "worksheets",
                format!("group {} on {}", batch.group_id, batch.date),
            ));
        }
        let by_worker: HashMap<&str, &Worksheet> = worksheets
            .iter()
            .map(|ws| (ws.worker_id.as_str(), ws))
            .collect();

        let now = Utc::now();
        let mut changes = Vec::new();
        let mut updated_workers = Vec::new();
        let mut skipped_workers = Vec::new();
        for output in &batch.outputs {
            let Some(worksheet) = by_worker.get(output.worker_id.as_str()) else {
                debug!(
                    group_id = %batch.group_id,
                    worker_id = %output.worker_id,
                    "Skipping worker without a worksheet in the group"
                );
                skipped_workers.push(output.worker_id.clone());
                continue;
            };
            ensure_editable(worksheet)?;

            let mut record = worksheet.record(batch.work_hour).cloned().ok_or_else(|| {
                EngineError::bad_request(format!(
                    "worksheet of worker {} has no hour {}",
                    output.worker_id, batch.work_hour
                ))
            })?;
            if let Some(expected) = output.expected_version.filter(|v| *v != record.version) {
                return Err(EngineError::conflict(format!(
                    "hour {} of worker {} is at version {}, expected {}",
                    batch.work_hour, output.worker_id, record.version, expected
                )));
            }

            record.replace_items(&output.entries, worksheet.planned_output_per_hour, &actor.id, now);
            changes.push(Change::Records {
                worksheet_id: worksheet.id,
                records: vec![record],
            });
            updated_workers.push(output.worker_id.clone());
        }

        let stored = if changes.is_empty() {
            Vec::new()
        } else {
            self.store.commit(changes).await?
        };
        let by_worker: HashMap<&str, &Worksheet> =
            stored.iter().map(|ws| (ws.worker_id.as_str(), ws)).collect();
        let records = updated_workers
            .iter()
            .filter_map(|worker_id| by_worker.get(worker_id.as_str()))
            .filter_map(|ws| ws.record(batch.work_hour).cloned())
            .collect();

        info!(
            actor_id = %actor.id,
            group_id = %batch.group_id,
            date = %batch.date,
            work_hour = batch.work_hour,
            updated = updated_workers.len(),
            skipped = skipped_workers.len(),
            duration_us = started.elapsed().as_micros(),
            "Hour batch applied"
        );
        if !updated_workers.is_empty() {
            self.publish(
                &batch.group_id,
                batch.date,
                Some(batch.work_hour),
                updated_workers.len(),
                ChangeKind::BatchUpdated,
            );
        }

        Ok(BatchUpdateOutcome {
            group_id: batch.group_id,
            date: batch.date,
            work_hour: batch.work_hour,
            updated_workers,
            skipped_workers,
            records,
        })
    }

    /// Checks every output before anything is loaded for writing.
    async fn validate_outputs(&self, outputs: &[WorkerOutput]) -> EngineResult<()> {
        if outputs.is_empty() {
            return Err(EngineError::validation("outputs", "must not be empty"));
        }
        let mut seen = HashSet::new();
        let mut pairings = HashSet::new();
        for output in outputs {
            if !seen.insert(output.worker_id.as_str()) {
                return Err(EngineError::validation(
                    "outputs",
                    format!("worker {} listed twice", output.worker_id),
                ));
            }
            if output.entries.is_empty() {
                return Err(EngineError::validation(
                    "entries",
                    format!("worker {} has no entries", output.worker_id),
                ));
            }
            for entry in &output.entries {
                pairings.insert((entry.product_id.as_str(), entry.process_id.as_str()));
            }
        }
        for (product_id, process_id) in pairings {
            self.ensure_pairing(product_id, process_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordStatus, Role};
    use crate::schedule::ShiftType;
    use crate::service::test_support::{create_for_group, date, harness, leader};

    fn entry(process_id: &str, planned: Option<u32>, actual: u32) -> OutputEntry {
        OutputEntry {
            product_id: "prod_shirt".to_string(),
            process_id: process_id.to_string(),
            planned_output: planned,
            actual_output: actual,
            note: None,
        }
    }

    fn batch(work_hour: u32, outputs: Vec<WorkerOutput>) -> HourBatch {
        HourBatch {
            group_id: "group_a1".to_string(),
            work_hour,
            date: date(),
            outputs,
        }
    }

    fn output(worker_id: &str, entries: Vec<OutputEntry>) -> WorkerOutput {
        WorkerOutput {
            worker_id: worker_id.to_string(),
            entries,
            expected_version: None,
        }
    }

    #[tokio::test]
    async fn test_first_hour_falls_back_to_hourly_target() {
        let h = harness();
        h.service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();

        let outcome = h
            .service
            .batch_update_hour(
                &leader(),
                batch(1, vec![output("worker_a1_1", vec![entry("proc_collar", None, 150)])]),
            )
            .await
            .unwrap();

        assert_eq!(outcome.updated_workers, vec!["worker_a1_1".to_string()]);
        let record = &outcome.records[0];
        assert_eq!(record.status, RecordStatus::Completed);
        assert_eq!(record.planned_output, 180);
        assert_eq!(record.actual_output, 150);
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.version, 2);

        let events = h.publisher.events();
        let last = events.last().unwrap();
        assert_eq!(last.change, ChangeKind::BatchUpdated);
        assert_eq!(last.work_hour, Some(1));
        assert_eq!(last.affected_workers, 1);
    }

    #[tokio::test]
    async fn test_replaying_a_batch_yields_same_items() {
        let h = harness();
        h.service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();
        let payload = batch(
            4,
            vec![output(
                "worker_a1_2",
                vec![entry("proc_collar", Some(100), 90), entry("proc_sleeve", Some(80), 85)],
            )],
        );

        let first = h.service.batch_update_hour(&leader(), payload.clone()).await.unwrap();
        let second = h.service.batch_update_hour(&leader(), payload).await.unwrap();

        let shape = |record: &WorksheetRecord| {
            record
                .items
                .iter()
                .map(|i| (i.entry_index, i.process_id.clone(), i.planned_output, i.actual_output))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&first.records[0]), shape(&second.records[0]));
        assert_eq!(first.records[0].planned_output, second.records[0].planned_output);
        assert_eq!(second.records[0].actual_output, 175);
    }

    #[tokio::test]
    async fn test_unknown_workers_are_skipped() {
        let h = harness();
        h.service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();

        let outcome = h
            .service
            .batch_update_hour(
                &leader(),
                batch(
                    2,
                    vec![
                        output("worker_a2_1", vec![entry("proc_collar", None, 10)]),
                        output("worker_a1_3", vec![entry("proc_collar", None, 120)]),
                    ],
                ),
            )
            .await
            .unwrap();

        assert_eq!(outcome.updated_workers, vec!["worker_a1_3".to_string()]);
        assert_eq!(outcome.skipped_workers, vec!["worker_a2_1".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_hour_fails_whole_batch() {
        let h = harness();
        h.service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();
        let result = h
            .service
            .batch_update_hour(
                &leader(),
                batch(9, vec![output("worker_a1_1", vec![entry("proc_collar", None, 10)])]),
            )
            .await;

        assert!(matches!(result, Err(EngineError::BadRequest { .. })));
        let stored = h.service.store().find_by_group_date("group_a1", date()).await.unwrap();
        assert!(stored.iter().all(|ws| ws.records.iter().all(|r| r.version == 1)));
    }

    #[tokio::test]
    async fn test_stale_expected_version_conflicts() {
        let h = harness();
        h.service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();
        let mut stale = output("worker_a1_1", vec![entry("proc_collar", None, 100)]);
        stale.expected_version = Some(1);
        h.service
            .batch_update_hour(&leader(), batch(1, vec![stale.clone()]))
            .await
            .unwrap();

        let result = h.service.batch_update_hour(&leader(), batch(1, vec![stale])).await;
        assert!(matches!(result, Err(EngineError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_no_worksheets_is_not_found() {
        let h = harness();
        let result = h
            .service
            .batch_update_hour(
                &leader(),
                batch(1, vec![output("worker_a1_1", vec![entry("proc_collar", None, 1)])]),
            )
            .await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_worker_cannot_submit_for_group() {
        let h = harness();
        let result = h
            .service
            .batch_update_hour(
                &Actor::new("worker_a1_1", Role::Worker),
                batch(1, vec![output("worker_a1_1", vec![entry("proc_collar", None, 1)])]),
            )
            .await;
        assert!(matches!(result, Err(EngineError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn test_invalid_pairing_rejected_before_load() {
        let h = harness();
        h.service
            .create_worksheets(&leader(), create_for_group(ShiftType::Normal))
            .await
            .unwrap();
        let result = h
            .service
            .batch_update_hour(
                &leader(),
                batch(1, vec![output("worker_a1_1", vec![entry("proc_hem", None, 1)])]),
            )
            .await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_worker_is_validation_error() {
        let h = harness();
        let result = h
            .service
            .batch_update_hour(
                &leader(),
                batch(
                    1,
                    vec![
                        output("worker_a1_1", vec![entry("proc_collar", None, 1)]),
                        output("worker_a1_1", vec![entry("proc_collar", None, 2)]),
                    ],
                ),
            )
            .await;
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }
}
