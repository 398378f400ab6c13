//! In memory implementation of the WorksheetStore port.
//!
//! Holds every worksheet behind one lock. A commit validates all of its
//! changes before applying any of them, which gives the same all-or-nothing
//! behaviour a database transaction would.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Worksheet, WorksheetStatus};

use super::{Change, Stamp, WorksheetStore};

#[derive(Debug, Default)]
struct State {
    sheets: HashMap<Uuid, Worksheet>,
    by_worker_date: HashMap<(String, NaiveDate), Uuid>,
}

impl State {
    fn stored(&self, id: Uuid) -> EngineResult<&Worksheet> {
        self.sheets
            .get(&id)
            .ok_or_else(|| EngineError::not_found("worksheet", id))
    }

    fn check(&self, change: &Change, pending_keys: &mut HashSet<(String, NaiveDate)>) -> EngineResult<()> {
        match change {
            Change::Insert(worksheet) => {
                let key = (worksheet.worker_id.clone(), worksheet.date);
                if self.by_worker_date.contains_key(&key) || !pending_keys.insert(key) {
                    return Err(EngineError::conflict(format!(
                        "worksheet already exists for worker {} on {}",
                        worksheet.worker_id, worksheet.date
                    )));
                }
                Ok(())
            }
            Change::Replace { worksheet, expected } => {
                let stored = self.stored(worksheet.id)?;
                if Stamp::of(stored) != *expected {
                    return Err(EngineError::conflict(format!(
                        "worksheet {} was modified concurrently",
                        worksheet.id
                    )));
                }
                Ok(())
            }
            Change::Records { worksheet_id, records } => {
                let stored = self.stored(*worksheet_id)?;
                for record in records {
                    let current = stored.records.iter().find(|r| r.id == record.id);
                    match current {
                        Some(current) if current.version == record.version => {}
                        Some(_) => {
                            return Err(EngineError::conflict(format!(
                                "hour {} of worksheet {} was modified concurrently",
                                record.work_hour, worksheet_id
                            )));
                        }
                        None => {
                            return Err(EngineError::conflict(format!(
                                "hour {} of worksheet {} no longer exists",
                                record.work_hour, worksheet_id
                            )));
                        }
                    }
                }
                Ok(())
            }
            Change::Delete {
                worksheet_id,
                expected_version,
            } => {
                let stored = self.stored(*worksheet_id)?;
                if stored.version != *expected_version {
                    return Err(EngineError::conflict(format!(
                        "worksheet {} was modified concurrently",
                        worksheet_id
                    )));
                }
                Ok(())
            }
        }
    }

    fn apply(&mut self, change: Change) -> Option<Worksheet> {
        match change {
            Change::Insert(mut worksheet) => {
                worksheet.version = 1;
                for record in worksheet.records.iter_mut() {
                    record.version = 1;
                }
                self.by_worker_date
                    .insert((worksheet.worker_id.clone(), worksheet.date), worksheet.id);
                self.sheets.insert(worksheet.id, worksheet.clone());
                Some(worksheet)
            }
            Change::Replace { mut worksheet, .. } => {
                let previous = self.sheets.get(&worksheet.id)?;
                worksheet.version = previous.version + 1;
                for record in worksheet.records.iter_mut() {
                    match previous.records.iter().find(|r| r.id == record.id) {
                        Some(old) if old == record => {}
                        Some(old) => record.version = old.version + 1,
                        None => record.version = 1,
                    }
                }
                self.sheets.insert(worksheet.id, worksheet.clone());
                Some(worksheet)
            }
            Change::Records {
                worksheet_id,
                records,
            } => {
                let stored = self.sheets.get_mut(&worksheet_id)?;
                for mut record in records {
                    if let Some(slot) = stored.records.iter_mut().find(|r| r.id == record.id) {
                        record.version = slot.version + 1;
                        *slot = record;
                    }
                }
                Some(stored.clone())
            }
            Change::Delete { worksheet_id, .. } => {
                if let Some(removed) = self.sheets.remove(&worksheet_id) {
                    self.by_worker_date.remove(&(removed.worker_id, removed.date));
                }
                None
            }
        }
    }

    fn sorted(mut sheets: Vec<Worksheet>) -> Vec<Worksheet> {
        sheets.sort_by(|a, b| a.worker_id.cmp(&b.worker_id).then(a.date.cmp(&b.date)));
        sheets
    }
}

/// Worksheet storage held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryWorksheetStore {
    inner: RwLock<State>,
}

impl InMemoryWorksheetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorksheetStore for InMemoryWorksheetStore {
    async fn get(&self, id: Uuid) -> EngineResult<Option<Worksheet>> {
        Ok(self.inner.read().await.sheets.get(&id).cloned())
    }

    async fn find_by_group_date(&self, group_id: &str, date: NaiveDate) -> EngineResult<Vec<Worksheet>> {
        let state = self.inner.read().await;
        Ok(State::sorted(
            state
                .sheets
                .values()
                .filter(|ws| ws.group_id == group_id && ws.date == date)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_date(&self, date: NaiveDate) -> EngineResult<Vec<Worksheet>> {
        let state = self.inner.read().await;
        Ok(State::sorted(
            state.sheets.values().filter(|ws| ws.date == date).cloned().collect(),
        ))
    }

    async fn existing_workers(&self, worker_ids: &[String], date: NaiveDate) -> EngineResult<Vec<String>> {
        let state = self.inner.read().await;
        Ok(worker_ids
            .iter()
            .filter(|id| state.by_worker_date.contains_key(&((*id).clone(), date)))
            .cloned()
            .collect())
    }

    async fn find_unarchived_before(&self, date: NaiveDate) -> EngineResult<Vec<Worksheet>> {
        let state = self.inner.read().await;
        Ok(State::sorted(
            state
                .sheets
                .values()
                .filter(|ws| ws.date < date && ws.status != WorksheetStatus::Archived)
                .cloned()
                .collect(),
        ))
    }

    async fn commit(&self, changes: Vec<Change>) -> EngineResult<Vec<Worksheet>> {
        let mut state = self.inner.write().await;

        let mut touched = HashSet::new();
        let mut pending_keys = HashSet::new();
        for change in &changes {
            if !touched.insert(change.worksheet_id()) {
                return Err(EngineError::bad_request(format!(
                    "worksheet {} appears twice in one commit",
                    change.worksheet_id()
                )));
            }
            state.check(change, &mut pending_keys)?;
        }

        Ok(changes
            .into_iter()
            .filter_map(|change| state.apply(change))
            .collect())
    }
}
