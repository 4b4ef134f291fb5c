//! Request and response shapes shared by the engine, the hub and the CLI.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fl_core::{FieldId, LogRecord};
use serde::{Deserialize, Serialize};

/// Page size used when a request carries no pagination block.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

// =============================================================================
// Filters
// =============================================================================

/// How a [`FilterCondition`] combines its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Field contains at least one value.
    #[serde(rename = "in")]
    In,
    /// Field contains none of the values.
    #[serde(rename = "notIn")]
    NotIn,
    /// Field contains every value.
    #[serde(rename = "and")]
    ContainsAll,
}

/// A condition on one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub operator: FilterOperator,
    #[serde(default)]
    pub values: Vec<String>,
}

impl FilterCondition {
    /// Builds a condition, dropping repeated values while keeping first-seen order.
    pub fn new<I, S>(operator: FilterOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Self {
            operator,
            values: unique,
        }
    }

    pub fn any_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FilterOperator::In, values)
    }

    /// A condition without values filters nothing.
    pub fn is_inert(&self) -> bool {
        self.values.is_empty()
    }
}

/// At most one condition per column.
pub type ColumnFilters = BTreeMap<FieldId, FilterCondition>;

// =============================================================================
// Sort
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Requested ordering. Either part unset means newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub field: Option<FieldId>,
    #[serde(default)]
    pub direction: Option<SortDirection>,
}

impl SortSpec {
    pub fn by(field: FieldId, direction: SortDirection) -> Self {
        Self {
            field: Some(field),
            direction: Some(direction),
        }
    }

    /// The concrete field and direction the sort stage applies. Unless both
    /// parts are set, the default order (newest first) applies.
    pub fn resolved(&self) -> (FieldId, SortDirection) {
        match (self.field, self.direction) {
            (Some(field), Some(direction)) => (field, direction),
            _ => (FieldId::Timestamp, SortDirection::Descending),
        }
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// One node of a group-by tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNode {
    pub key: String,
    pub count: usize,
    #[serde(default)]
    pub subgroups: Vec<GroupNode>,
}

impl GroupNode {
    /// Sum of the counts at the deepest level below this node.
    pub fn leaf_total(&self) -> usize {
        if self.subgroups.is_empty() {
            self.count
        } else {
            self.subgroups.iter().map(GroupNode::leaf_total).sum()
        }
    }
}

/// One bucket of a trend chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub bucket_start: DateTime<Utc>,
    pub count: usize,
    #[serde(default)]
    pub breakdown: BTreeMap<String, usize>,
}

// =============================================================================
// Request / Response
// =============================================================================

/// Caller-supplied window bounds, as ISO-8601 instants or calendar dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One dashboard query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub time_window: Option<DateRange>,
    /// Relative window ending now, e.g. `"7 days"`.
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(default)]
    pub filters: ColumnFilters,
    #[serde(default)]
    pub group_by: Vec<FieldId>,
    #[serde(default)]
    pub breakdown_field: Option<FieldId>,
}

impl QueryRequest {
    pub fn pagination(&self) -> Pagination {
        self.pagination.unwrap_or_default()
    }

    pub fn sort(&self) -> SortSpec {
        self.sort.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub request_id: String,
    pub logs: Vec<LogRecord>,
    pub total_count: usize,
    pub group_data: Vec<GroupNode>,
    pub chart_data: Vec<TrendPoint>,
}

impl QueryResponse {
    pub fn empty(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            ..Self::default()
        }
    }
}

/// A listing narrowed by keys clicked in a group tree or chart legend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDownRequest {
    pub query: QueryRequest,
    #[serde(default)]
    pub keys: BTreeMap<FieldId, String>,
}

/// An export of the full result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub query: QueryRequest,
    /// Columns to emit; all columns when empty.
    #[serde(default)]
    pub columns: Vec<FieldId>,
}
