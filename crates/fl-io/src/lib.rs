//! # fl-io: The "Source" of FAULTLINE
//!
//! Where records come from. The engine only ever sees a `Vec<LogRecord>`;
//! this crate produces one, either from a JSON-lines journal on disk or from
//! a seeded generator of realistic report-server errors.

pub mod generator;
pub mod journal;

use fl_core::LogRecord;

/// Anything that can produce a full snapshot of records.
pub trait RecordSource: Send + Sync {
    /// Short human-readable description, for status pages and logs.
    fn describe(&self) -> String;

    /// Loads every record.
    fn load(&self) -> std::io::Result<Vec<LogRecord>>;
}
