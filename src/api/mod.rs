//! HTTP API module for the worksheet engine.
//!
//! This module exposes worksheet creation, the batch hourly update, hour
//! edits, the group grid and the organization report as REST endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AdjustTargetRequest, ArchiveRequest, BatchUpdateRequest, CreateWorksheetRequest, GridQuery,
    ShiftChangeRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::{ACTOR_HEADER, AppState};
