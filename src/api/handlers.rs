//! HTTP request handlers for the worksheet engine API.
//!
//! Every handler tags its logs with a fresh correlation id, resolves the
//! actor from the `x-actor-id` header and maps engine errors to [`ApiError`]
//! bodies.

use std::time::Instant;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::report::ReportQuery;
use crate::service::{BulkUpdate, CopyForward, CreateWorksheets, HourBatch};

use super::request::{
    AdjustTargetRequest, ArchiveRequest, BatchUpdateRequest, CreateWorksheetRequest, GridQuery,
    ShiftChangeRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/worksheets", post(create_worksheets_handler))
        .route("/worksheets/archive-expired", post(archive_expired_handler))
        .route("/worksheets/reports/by-organization", get(report_handler))
        .route(
            "/worksheets/group/:group_id/hour/:work_hour/batch-update",
            post(batch_update_handler),
        )
        .route("/worksheets/group/:group_id/grid", get(grid_handler))
        .route("/worksheets/group/:group_id/bulk-update", put(bulk_update_handler))
        .route(
            "/worksheets/:id",
            get(get_worksheet_handler).delete(remove_worksheet_handler),
        )
        .route("/worksheets/:id/complete", post(complete_handler))
        .route(
            "/worksheets/:id/adjust-target/:work_hour",
            patch(adjust_target_handler),
        )
        .route("/worksheets/:id/copy-forward", post(copy_forward_handler))
        .route("/worksheets/:id/shift", post(shift_change_handler))
        .with_state(state)
}

/// Handler for POST /worksheets.
async fn create_worksheets_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateWorksheetRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing create worksheets request");
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = async {
        let actor = state.actor(&headers).await?;
        let input = CreateWorksheets::try_from(request)?;
        state.service().create_worksheets(&actor, input).await
    }
    .await;
    respond(correlation_id, StatusCode::CREATED, result)
}

/// Handler for GET /worksheets/{id}.
async fn get_worksheet_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = async {
        state.actor(&headers).await?;
        state.service().get_worksheet(id).await
    }
    .await;
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for DELETE /worksheets/{id}.
async fn remove_worksheet_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, worksheet_id = %id, "Processing remove request");
    let result = async {
        let actor = state.actor(&headers).await?;
        state.service().remove(&actor, id).await
    }
    .await;
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /worksheets/{id}/complete.
async fn complete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, worksheet_id = %id, "Processing complete request");
    let result = async {
        let actor = state.actor(&headers).await?;
        state.service().complete(&actor, id).await
    }
    .await;
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for PATCH /worksheets/{id}/adjust-target/{workHour}.
async fn adjust_target_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, work_hour)): Path<(Uuid, u32)>,
    payload: Result<Json<AdjustTargetRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, worksheet_id = %id, work_hour, "Processing adjust target request");
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = async {
        let actor = state.actor(&headers).await?;
        state
            .service()
            .adjust_target(&actor, id, work_hour, request.planned_output)
            .await
    }
    .await;
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for POST /worksheets/{id}/copy-forward.
async fn copy_forward_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<CopyForward>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, worksheet_id = %id, "Processing copy forward request");
    let copy = match payload {
        Ok(Json(copy)) => copy,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = async {
        let actor = state.actor(&headers).await?;
        state.service().copy_forward(&actor, id, copy).await
    }
    .await;
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for POST /worksheets/{id}/shift.
async fn shift_change_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<ShiftChangeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, worksheet_id = %id, "Processing shift change request");
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = async {
        let actor = state.actor(&headers).await?;
        state
            .service()
            .resize_for_shift_change(&actor, id, request.shift_type)
            .await
    }
    .await;
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for POST /worksheets/group/{groupId}/hour/{workHour}/batch-update.
async fn batch_update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, work_hour)): Path<(String, u32)>,
    payload: Result<Json<BatchUpdateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        group_id = %group_id,
        work_hour,
        "Processing batch update request"
    );
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = async {
        let actor = state.actor(&headers).await?;
        state
            .service()
            .batch_update_hour(
                &actor,
                HourBatch {
                    group_id,
                    work_hour,
                    date: request.date,
                    outputs: request.outputs,
                },
            )
            .await
    }
    .await;
    if let Ok(outcome) = &result {
        info!(
            correlation_id = %correlation_id,
            updated = outcome.updated_workers.len(),
            duration_us = start_time.elapsed().as_micros(),
            "Batch update completed successfully"
        );
    }
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for GET /worksheets/group/{groupId}/grid?date=.
async fn grid_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Query(query): Query<GridQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = async {
        state.actor(&headers).await?;
        state.service().group_grid(&group_id, query.date).await
    }
    .await;
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for PUT /worksheets/group/{groupId}/bulk-update.
async fn bulk_update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    payload: Result<Json<BulkUpdate>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, group_id = %group_id, "Processing bulk update request");
    let update = match payload {
        Ok(Json(update)) => update,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = async {
        let actor = state.actor(&headers).await?;
        state.service().bulk_update_group(&actor, &group_id, update).await
    }
    .await;
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for POST /worksheets/archive-expired.
async fn archive_expired_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing archive request");
    // An empty body means "archive as of the factory's today".
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ArchiveRequest::default()
    } else if !has_json_content_type(&headers) {
        return bad_body_response(correlation_id, missing_content_type());
    } else {
        match Json::<ArchiveRequest>::from_bytes(&body) {
            Ok(Json(request)) => request,
            Err(rejection) => return rejection_response(correlation_id, rejection),
        }
    };
    let today = request.today.unwrap_or_else(|| state.today());

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Archived {
        archived: usize,
    }

    let result = async {
        let actor = state.actor(&headers).await?;
        let archived = state.service().archive_expired(&actor, today).await?;
        Ok::<_, EngineError>(Archived { archived })
    }
    .await;
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for GET /worksheets/reports/by-organization.
async fn report_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, date = %query.date, "Processing report request");
    let result = async {
        state.actor(&headers).await?;
        state.reports().build(query).await
    }
    .await;
    respond(correlation_id, StatusCode::OK, result)
}

fn respond<T: Serialize>(correlation_id: Uuid, status: StatusCode, result: EngineResult<T>) -> Response {
    match result {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], Json(body)).into_response(),
        Err(err) => error_response(correlation_id, err),
    }
}

fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        kind = err.kind(),
        error = %err,
        "Request failed"
    );
    ApiErrorResponse::from(err)
        .correlated(correlation_id)
        .into_response()
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            // Well-formed JSON that does not describe a valid request.
            ApiError::validation_error(body_text)
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => missing_content_type(),
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    bad_body_response(correlation_id, error)
}

fn missing_content_type() -> ApiError {
    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
}

fn bad_body_response(correlation_id: Uuid, error: ApiError) -> Response {
    ApiErrorResponse {
        status: StatusCode::BAD_REQUEST,
        error: error.correlated(correlation_id),
    }
    .into_response()
}
