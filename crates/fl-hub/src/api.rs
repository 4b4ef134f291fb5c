//! # API Handlers
//!
//! Axum handlers for the log endpoints. Each handler takes a snapshot of the
//! store, fills in hub-side request defaults and hands the request to the
//! [`QueryEngine`](fl_query::QueryEngine).

use crate::sources::SourceInfo;
use crate::{ApiError, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use fl_core::{field_table, FieldId, FieldKind};
use fl_query::{
    DrillDownRequest, ErrorKind, ExportRequest, Pagination, QueryError, QueryRequest,
    QueryResponse, TrendPoint,
};
use serde::Serialize;
use std::sync::Arc;

type Rejection = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<Json<T>, Rejection>;

fn rejected(e: QueryError) -> Rejection {
    let status = match e.kind() {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
    };
    (status, Json(ApiError { error: e.to_string() }))
}

/// Unwraps a JSON body, reporting a malformed one in the `ApiError` shape.
/// Bodies that parse but do not fit the request type (unknown field or
/// operator, wrong value type) are invalid arguments.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Rejection> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let status = match rejection.status() {
                StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
                other => other,
            };
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            Err((status, Json(ApiError { error: rejection.body_text() })))
        }
    }
}

/// Fills a blank request id and the default page, and clamps oversized pages.
/// Non-positive sizes pass through for the engine to reject.
fn prepare(state: &AppState, mut request: QueryRequest) -> QueryRequest {
    if request.request_id.trim().is_empty() {
        request.request_id = uuid::Uuid::new_v4().to_string();
    }
    let server = &state.config.server;
    let mut pagination = request.pagination.unwrap_or(Pagination {
        page: 1,
        page_size: server.default_page_size,
    });
    if pagination.page_size > server.max_page_size {
        tracing::debug!(
            request_id = %request.request_id,
            "Clamping page size {} to {}",
            pagination.page_size,
            server.max_page_size
        );
        pagination.page_size = server.max_page_size;
    }
    request.pagination = Some(pagination);
    request
}

// =============================================================================
// Fields
// =============================================================================

#[derive(Serialize)]
pub struct FieldInfo {
    id: FieldId,
    label: &'static str,
    kind: FieldKind,
    hierarchical: bool,
}

pub async fn list_fields() -> Json<Vec<FieldInfo>> {
    let fields = field_table()
        .iter()
        .map(|d| FieldInfo {
            id: d.id,
            label: d.label,
            kind: d.kind,
            hierarchical: d.hierarchical,
        })
        .collect();
    Json(fields)
}

// =============================================================================
// Queries
// =============================================================================

pub async fn query_logs(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<QueryResponse> {
    let request = prepare(&state, body(payload)?);
    let records = state.store.snapshot().await;
    let response = state
        .engine
        .dashboard(&records, &request, Utc::now())
        .map_err(rejected)?;
    Ok(Json(response))
}

pub async fn group_logs(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<QueryResponse> {
    let request = prepare(&state, body(payload)?);
    let records = state.store.snapshot().await;
    let response = state
        .engine
        .group_summary(&records, &request, Utc::now())
        .map_err(rejected)?;
    Ok(Json(response))
}

pub async fn trend_logs(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Vec<TrendPoint>> {
    let request = prepare(&state, body(payload)?);
    let records = state.store.snapshot().await;
    let points = state
        .engine
        .trend(&records, &request, Utc::now())
        .map_err(rejected)?;
    Ok(Json(points))
}

pub async fn drill_down(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DrillDownRequest>, JsonRejection>,
) -> ApiResult<QueryResponse> {
    let mut request = body(payload)?;
    request.query = prepare(&state, request.query);
    let records = state.store.snapshot().await;
    let response = state
        .engine
        .drill_down(&records, &request, Utc::now())
        .map_err(rejected)?;
    Ok(Json(response))
}

// =============================================================================
// Export
// =============================================================================

pub async fn export_logs(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, Rejection> {
    let mut request = body(payload)?;
    request.query = prepare(&state, request.query);
    let records = state.store.snapshot().await;
    let now = Utc::now();
    let table = state
        .engine
        .export(&records, &request, now)
        .map_err(rejected)?;

    tracing::info!(
        request_id = %request.query.request_id,
        "Exporting {} rows x {} columns",
        table.rows.len(),
        table.columns.len()
    );
    let filename = format!("faultline-export-{}.csv", now.format("%Y%m%d-%H%M%S"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        table.to_csv(),
    )
        .into_response())
}

// =============================================================================
// Reload
// =============================================================================

#[derive(Serialize)]
pub struct ReloadResponse {
    records: usize,
    source: SourceInfo,
}

pub async fn reload_logs(State(state): State<Arc<AppState>>) -> ApiResult<ReloadResponse> {
    match state.store.reload().await {
        Ok(records) => Ok(Json(ReloadResponse {
            records,
            source: state.store.source(),
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: format!("reload failed: {}", e),
            }),
        )),
    }
}
