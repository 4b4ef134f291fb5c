//! # Query Errors
//!
//! Every failure the engine can report is a rejected request. Validation runs
//! before any stage, so a request either fails here or runs to completion.

use thiserror::Error;

/// Coarse classification of a [`QueryError`], for callers that only need to
/// pick a status code or a message style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("page size must be positive, got {0}")]
    InvalidPageSize(i64),

    #[error("page numbers start at 1, got {0}")]
    InvalidPage(i64),

    #[error("malformed time window: {0}")]
    MalformedWindow(String),

    #[error("malformed interval '{0}'")]
    MalformedInterval(String),

    #[error("timeWindow and interval are mutually exclusive")]
    ConflictingWindow,

    #[error("cannot drill down into missing values of '{0}'")]
    MissingValueDrillDown(String),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::InvalidPageSize(_)
            | QueryError::InvalidPage(_)
            | QueryError::MalformedWindow(_)
            | QueryError::MalformedInterval(_)
            | QueryError::ConflictingWindow
            | QueryError::MissingValueDrillDown(_) => ErrorKind::InvalidArgument,
        }
    }
}
