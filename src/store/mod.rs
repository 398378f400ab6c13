//! Worksheet persistence port.
//!
//! Every mutating operation loads worksheets, computes their new state and
//! hands the result to [`WorksheetStore::commit`] as one unit of work. A commit
//! either applies every change or none of them.
//!
//! Worksheets and records carry a `version` that the store bumps on each
//! write. Commits re-check the versions the caller loaded, so a writer that
//! raced another one fails with a conflict instead of silently overwriting it.

mod in_memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{Worksheet, WorksheetRecord};

pub use in_memory::InMemoryWorksheetStore;

/// The versions a worksheet had when it was loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    /// The worksheet's own version.
    pub worksheet_version: u64,
    /// `(record id, version)` of every record, in hour order.
    pub records: Vec<(Uuid, u64)>,
}

impl Stamp {
    /// Captures the current versions of a loaded worksheet.
    pub fn of(worksheet: &Worksheet) -> Self {
        Self {
            worksheet_version: worksheet.version,
            records: worksheet.records.iter().map(|r| (r.id, r.version)).collect(),
        }
    }
}

/// One change inside a commit.
#[derive(Debug, Clone)]
pub enum Change {
    /// Stores a new worksheet. Fails if the worker already has one that day.
    Insert(Worksheet),
    /// Replaces a whole worksheet, including its record set.
    Replace {
        /// The new state.
        worksheet: Worksheet,
        /// The versions the new state was computed from.
        expected: Stamp,
    },
    /// Replaces individual records; each carries the version it was loaded with.
    Records {
        /// The owning worksheet.
        worksheet_id: Uuid,
        /// The new record states.
        records: Vec<WorksheetRecord>,
    },
    /// Deletes a worksheet with its records and items.
    Delete {
        /// The worksheet to delete.
        worksheet_id: Uuid,
        /// The version the caller saw.
        expected_version: u64,
    },
}

impl Change {
    /// The worksheet the change touches.
    pub fn worksheet_id(&self) -> Uuid {
        match self {
            Change::Insert(worksheet) | Change::Replace { worksheet, .. } => worksheet.id,
            Change::Records { worksheet_id, .. } | Change::Delete { worksheet_id, .. } => {
                *worksheet_id
            }
        }
    }
}

/// Storage for worksheets and their records.
#[async_trait]
pub trait WorksheetStore: Send + Sync {
    /// Loads one worksheet.
    async fn get(&self, id: Uuid) -> EngineResult<Option<Worksheet>>;

    /// Loads every worksheet of a group for a date, ordered by worker id.
    async fn find_by_group_date(&self, group_id: &str, date: NaiveDate) -> EngineResult<Vec<Worksheet>>;

    /// Loads every worksheet for a date, ordered by worker id.
    async fn find_by_date(&self, date: NaiveDate) -> EngineResult<Vec<Worksheet>>;

    /// Returns the workers among `worker_ids` that already have a worksheet that day.
    async fn existing_workers(&self, worker_ids: &[String], date: NaiveDate) -> EngineResult<Vec<String>>;

    /// Loads non-archived worksheets dated strictly before `date`.
    async fn find_unarchived_before(&self, date: NaiveDate) -> EngineResult<Vec<Worksheet>>;

    /// Applies all changes atomically and returns the stored worksheets.
    ///
    /// Deleted worksheets are not part of the result.
    async fn commit(&self, changes: Vec<Change>) -> EngineResult<Vec<Worksheet>>;
}
