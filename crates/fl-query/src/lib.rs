//! # fl-query: The "Lens" of FAULTLINE
//!
//! The log query/aggregation engine. Given a slice of [`LogRecord`]s and a
//! [`QueryRequest`], it produces filtered pages, group-by trees and trend
//! series. Every stage is a pure function of its inputs; the input records are
//! only ever borrowed.
//!
//! Stages, leaf-first:
//!
//! - [`predicate`]: one condition against one record.
//! - [`filter`]: all conditions (AND) against a record set.
//! - [`sort`]: stable, type-aware, missing-last ordering.
//! - [`group`]: recursive group-by with counts.
//! - [`bucket`]: gapless time buckets with per-bucket breakdowns.
//! - [`paginate`]: 1-indexed page slicing.
//! - [`export`]: CSV row projection.
//! - [`executor`]: composes the stages per request kind.
//!
//! [`LogRecord`]: fl_core::LogRecord

pub mod bucket;
pub mod error;
pub mod executor;
pub mod export;
pub mod filter;
pub mod group;
pub mod model;
pub mod paginate;
pub mod predicate;
pub mod sequence;
pub mod sort;
pub mod window;

pub use bucket::{BucketPolicy, Granularity};
pub use error::{ErrorKind, QueryError};
pub use executor::{QueryEngine, Stage};
pub use export::ExportTable;
pub use model::{
    ColumnFilters, DateRange, DrillDownRequest, ExportRequest, FilterCondition, FilterOperator,
    GroupNode, Pagination, QueryRequest, QueryResponse, SortDirection, SortSpec, TrendPoint,
};
pub use sequence::RequestSequencer;
pub use window::TimeWindow;
