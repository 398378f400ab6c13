//! Application state for the worksheet engine API.

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{FixedOffset, NaiveDate, Utc};

use crate::config::ConfigLoader;
use crate::directory::{Directory, InMemoryDirectory};
use crate::error::{EngineError, EngineResult};
use crate::models::Actor;
use crate::notify::ChangePublisher;
use crate::report::ReportBuilder;
use crate::service::WorksheetService;
use crate::store::InMemoryWorksheetStore;

/// Header carrying the authenticated user id.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Shared application state.
///
/// Cloning is cheap: the service and report builder only hold `Arc`s.
#[derive(Clone)]
pub struct AppState {
    service: WorksheetService,
    reports: ReportBuilder,
    utc_offset: FixedOffset,
}

impl AppState {
    /// Creates a state from already wired components.
    pub fn new(service: WorksheetService, reports: ReportBuilder, utc_offset: FixedOffset) -> Self {
        Self {
            service,
            reports,
            utc_offset,
        }
    }

    /// Wires the in-memory store and directory from a loaded configuration.
    pub fn in_memory(config: &ConfigLoader, publisher: Arc<dyn ChangePublisher>) -> Self {
        let store = Arc::new(InMemoryWorksheetStore::new());
        let directory: Arc<dyn Directory> =
            Arc::new(InMemoryDirectory::new(config.organization().clone()));
        let service = WorksheetService::new(
            store.clone(),
            directory.clone(),
            publisher,
            config.utc_offset(),
            config.settings().archive_after_days,
        );
        Self::new(service, ReportBuilder::new(directory, store), config.utc_offset())
    }

    /// Returns the worksheet service.
    pub fn service(&self) -> &WorksheetService {
        &self.service
    }

    /// Returns the report builder.
    pub fn reports(&self) -> &ReportBuilder {
        &self.reports
    }

    /// The current date on the factory floor.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }

    /// Resolves the acting user from the request headers.
    pub async fn actor(&self, headers: &HeaderMap) -> EngineResult<Actor> {
        let actor_id = headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                EngineError::permission_denied("", format!("missing {} header", ACTOR_HEADER))
            })?;
        self.service.directory().actor(actor_id).await
    }
}
