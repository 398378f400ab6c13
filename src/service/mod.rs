//! Worksheet operations.
//!
//! [`WorksheetService`] is the write path of the engine and the entry point
//! for the grid view. Each operation authorizes the actor, validates its
//! input before touching storage, computes the new worksheet state in
//! memory and commits it in a single store call. A change event is published
//! only after the commit succeeded.

mod batch_update;
mod grid;
mod hour_edits;
mod lifecycle;

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use uuid::Uuid;

use crate::directory::Directory;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Actor, ChangeKind, Group, Worksheet, WorksheetStatus, WorksheetUpdated,
};
use crate::notify::ChangePublisher;
use crate::store::WorksheetStore;

pub use batch_update::{BatchUpdateOutcome, HourBatch, WorkerOutput};
pub use grid::{GridCell, GridRow, GroupGrid};
pub use hour_edits::CopyForward;
pub use lifecycle::{BulkUpdate, BulkUpdateOutcome, CreateWorksheets, WorksheetScope, WorksheetView};

/// Coordinates storage, the organization directory and change events.
#[derive(Clone)]
pub struct WorksheetService {
    store: Arc<dyn WorksheetStore>,
    directory: Arc<dyn Directory>,
    publisher: Arc<dyn ChangePublisher>,
    utc_offset: FixedOffset,
    archive_after_days: u32,
}

impl WorksheetService {
    /// Creates a service over the given ports.
    pub fn new(
        store: Arc<dyn WorksheetStore>,
        directory: Arc<dyn Directory>,
        publisher: Arc<dyn ChangePublisher>,
        utc_offset: FixedOffset,
        archive_after_days: u32,
    ) -> Self {
        Self {
            store,
            directory,
            publisher,
            utc_offset,
            archive_after_days,
        }
    }

    /// Returns the organization directory.
    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    /// Returns the worksheet store.
    pub fn store(&self) -> &Arc<dyn WorksheetStore> {
        &self.store
    }

    async fn group(&self, group_id: &str) -> EngineResult<Group> {
        self.directory
            .group(group_id)
            .await
            .ok_or_else(|| EngineError::not_found("group", group_id))
    }

    /// Admins act on any group; leaders only on their own.
    fn authorize_group(&self, actor: &Actor, group: &Group) -> EngineResult<()> {
        if actor.is_admin() || group.leader_id.as_deref() == Some(actor.id.as_str()) {
            return Ok(());
        }
        Err(EngineError::permission_denied(
            &actor.id,
            format!("not an admin or the leader of group {}", group.id),
        ))
    }

    fn authorize_admin(&self, actor: &Actor) -> EngineResult<()> {
        if actor.is_admin() {
            return Ok(());
        }
        Err(EngineError::permission_denied(&actor.id, "admin role required"))
    }

    async fn load(&self, worksheet_id: Uuid) -> EngineResult<Worksheet> {
        self.store
            .get(worksheet_id)
            .await?
            .ok_or_else(|| EngineError::not_found("worksheet", worksheet_id))
    }

    /// Loads a worksheet and checks the actor leads its group.
    async fn load_for_edit(&self, worksheet_id: Uuid, actor: &Actor) -> EngineResult<Worksheet> {
        let worksheet = self.load(worksheet_id).await?;
        let group = self.group(&worksheet.group_id).await?;
        self.authorize_group(actor, &group)?;
        ensure_editable(&worksheet)?;
        Ok(worksheet)
    }

    async fn ensure_pairing(&self, product_id: &str, process_id: &str) -> EngineResult<()> {
        if self.directory.is_valid_pairing(product_id, process_id).await {
            return Ok(());
        }
        Err(EngineError::not_found(
            "product-process pairing",
            format!("{}/{}", product_id, process_id),
        ))
    }

    fn publish(
        &self,
        group_id: &str,
        date: NaiveDate,
        work_hour: Option<u32>,
        affected_workers: usize,
        change: ChangeKind,
    ) {
        self.publisher.publish(WorksheetUpdated {
            group_id: group_id.to_string(),
            date,
            work_hour,
            affected_workers,
            change,
            occurred_at: Utc::now(),
        });
    }
}

/// Archived worksheets only accept admin removal.
fn ensure_editable(worksheet: &Worksheet) -> EngineResult<()> {
    if worksheet.status == WorksheetStatus::Archived {
        return Err(EngineError::bad_request(format!(
            "worksheet {} is archived",
            worksheet.id
        )));
    }
    Ok(())
}
