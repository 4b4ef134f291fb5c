//! # Query Executor
//!
//! Runs one request through the stages in a fixed order:
//!
//! ```text
//! Received → Filtered → Paged     (listing, drill-down)
//!                     → Grouped   (group summary)
//!                     → Bucketed  (trend)
//!                     → Projected (export)
//!          → Responded
//! ```
//!
//! Every request is validated before the first stage and then runs to
//! completion. The executor holds no per-request state, so one instance can
//! serve any number of concurrent callers.

use chrono::{DateTime, Utc};
use fl_core::{FieldId, LogRecord};

use crate::bucket::{bucket_trend, BucketPolicy};
use crate::error::QueryError;
use crate::export::{project, ExportTable};
use crate::filter::{filter, merge_drill_down};
use crate::group::group;
use crate::model::{
    ColumnFilters, DrillDownRequest, ExportRequest, Pagination, QueryRequest, QueryResponse,
    TrendPoint,
};
use crate::paginate::{self, paginate};
use crate::sort::sort;
use crate::window::{self, TimeWindow};

/// Pipeline position, reported in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Filtered,
    Paged,
    Grouped,
    Bucketed,
    Projected,
    Responded,
}

/// The records a request selected, plus the window that bounded them.
struct Scope<'a> {
    window: TimeWindow,
    records: Vec<&'a LogRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    policy: BucketPolicy,
}

impl QueryEngine {
    pub fn new(policy: BucketPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &BucketPolicy {
        &self.policy
    }

    /// The dashboard view: a page of logs (or a group tree when `group_by` is
    /// set) together with the trend series.
    pub fn dashboard(
        &self,
        records: &[LogRecord],
        request: &QueryRequest,
        now: DateTime<Utc>,
    ) -> Result<QueryResponse, QueryError> {
        let pagination = checked_pagination(request)?;
        let Some(scope) = self.select(records, request, &request.filters, now)? else {
            return Ok(QueryResponse::empty(&request.request_id));
        };

        let mut response = if request.group_by.is_empty() {
            self.paged(&scope, request, pagination)?
        } else {
            self.grouped(&scope, request)
        };
        response.chart_data = self.bucketed(&scope, request);
        trace(request, Stage::Responded, response.total_count);
        Ok(response)
    }

    /// Filter → Sort → Paginate.
    pub fn listing(
        &self,
        records: &[LogRecord],
        request: &QueryRequest,
        now: DateTime<Utc>,
    ) -> Result<QueryResponse, QueryError> {
        let pagination = checked_pagination(request)?;
        let Some(scope) = self.select(records, request, &request.filters, now)? else {
            return Ok(QueryResponse::empty(&request.request_id));
        };
        let response = self.paged(&scope, request, pagination)?;
        trace(request, Stage::Responded, response.total_count);
        Ok(response)
    }

    /// Filter → Group.
    pub fn group_summary(
        &self,
        records: &[LogRecord],
        request: &QueryRequest,
        now: DateTime<Utc>,
    ) -> Result<QueryResponse, QueryError> {
        let Some(scope) = self.select(records, request, &request.filters, now)? else {
            return Ok(QueryResponse::empty(&request.request_id));
        };
        let response = self.grouped(&scope, request);
        trace(request, Stage::Responded, response.total_count);
        Ok(response)
    }

    /// Filter → Bucket. Sort, grouping and pagination are ignored.
    pub fn trend(
        &self,
        records: &[LogRecord],
        request: &QueryRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrendPoint>, QueryError> {
        let Some(scope) = self.select(records, request, &request.filters, now)? else {
            return Ok(Vec::new());
        };
        let points = self.bucketed(&scope, request);
        trace(request, Stage::Responded, points.len());
        Ok(points)
    }

    /// Narrows the base query by the clicked keys and answers with a flat page.
    pub fn drill_down(
        &self,
        records: &[LogRecord],
        request: &DrillDownRequest,
        now: DateTime<Utc>,
    ) -> Result<QueryResponse, QueryError> {
        let filters = merge_drill_down(&request.query.filters, &request.keys)
            .map_err(|e| rejected(&request.query, e))?;
        let query = QueryRequest {
            filters,
            group_by: Vec::new(),
            ..request.query.clone()
        };
        self.listing(records, &query, now)
    }

    /// Filter → Sort → Project over the full result set.
    pub fn export(
        &self,
        records: &[LogRecord],
        request: &ExportRequest,
        now: DateTime<Utc>,
    ) -> Result<ExportTable, QueryError> {
        let query = &request.query;
        let columns: Vec<FieldId> = if request.columns.is_empty() {
            FieldId::ALL.to_vec()
        } else {
            request.columns.clone()
        };
        let Some(scope) = self.select(records, query, &query.filters, now)? else {
            return Ok(ExportTable {
                columns,
                rows: Vec::new(),
            });
        };
        let sorted = sort(&scope.records, &query.sort());
        let rows = project(&sorted, &columns);
        trace(query, Stage::Projected, rows.len());
        Ok(ExportTable { columns, rows })
    }

    // =========================================================================
    // Stages
    // =========================================================================

    /// Resolves the window and applies it together with the column filters.
    /// `None` means the request had no window at all.
    fn select<'a>(
        &self,
        records: &'a [LogRecord],
        request: &QueryRequest,
        filters: &ColumnFilters,
        now: DateTime<Utc>,
    ) -> Result<Option<Scope<'a>>, QueryError> {
        trace(request, Stage::Received, records.len());
        let window = window::resolve(
            request.time_window.as_ref(),
            request.interval.as_deref(),
            now,
        )
        .map_err(|e| rejected(request, e))?;
        let Some(window) = window else {
            tracing::debug!(
                request_id = %request.request_id,
                "No time window or interval; answering empty"
            );
            return Ok(None);
        };

        let in_window = records
            .iter()
            .filter(|r| r.timestamp.map_or(false, |ts| window.contains(ts)));
        let selected = filter(in_window, filters);
        trace(request, Stage::Filtered, selected.len());
        Ok(Some(Scope {
            window,
            records: selected,
        }))
    }

    fn paged(
        &self,
        scope: &Scope<'_>,
        request: &QueryRequest,
        pagination: Pagination,
    ) -> Result<QueryResponse, QueryError> {
        let sorted = sort(&scope.records, &request.sort());
        let page = paginate(&sorted, pagination.page, pagination.page_size)?;
        trace(request, Stage::Paged, page.len());
        Ok(QueryResponse {
            request_id: request.request_id.clone(),
            logs: page.iter().map(|&r| r.clone()).collect(),
            total_count: scope.records.len(),
            ..QueryResponse::default()
        })
    }

    fn grouped(&self, scope: &Scope<'_>, request: &QueryRequest) -> QueryResponse {
        let forest = group(&scope.records, &request.group_by);
        trace(request, Stage::Grouped, forest.len());
        QueryResponse {
            request_id: request.request_id.clone(),
            total_count: scope.records.len(),
            group_data: forest,
            ..QueryResponse::default()
        }
    }

    fn bucketed(&self, scope: &Scope<'_>, request: &QueryRequest) -> Vec<TrendPoint> {
        let points = bucket_trend(
            &scope.records,
            &scope.window,
            request.breakdown_field,
            &self.policy,
        );
        trace(request, Stage::Bucketed, points.len());
        points
    }
}

fn checked_pagination(request: &QueryRequest) -> Result<Pagination, QueryError> {
    let pagination = request.pagination();
    paginate::validate(pagination.page, pagination.page_size)
        .map_err(|e| rejected(request, e))?;
    Ok(pagination)
}

fn trace(request: &QueryRequest, stage: Stage, count: usize) {
    tracing::debug!(
        request_id = %request.request_id,
        stage = ?stage,
        count,
        "Query stage"
    );
}

fn rejected(request: &QueryRequest, error: QueryError) -> QueryError {
    tracing::warn!(request_id = %request.request_id, "Rejected query: {}", error);
    error
}
