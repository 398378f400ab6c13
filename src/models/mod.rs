//! Core data models for the worksheet engine.
//!
//! This module contains the persisted worksheet entities, the organization
//! entities they reference, and the change event they emit.

mod event;
mod organization;
mod worksheet;

pub use event::{ChangeKind, WORKSHEET_UPDATED, WorksheetUpdated};
pub use organization::{
    Actor, Catalogued, Department, Group, Office, ProductProcess, Role, Team, Worker,
};
pub use worksheet::{
    NewWorksheet, OutputEntry, RecordStatus, ResizeOutcome, Worksheet, WorksheetRecord,
    WorksheetRecordItem, WorksheetStatus,
};
