//! # Journal: JSON-lines record files
//!
//! One [`LogRecord`] per line, UTF-8, `\n` separated. Blank lines are
//! ignored. A line that does not parse fails the whole load with
//! [`std::io::ErrorKind::InvalidData`] naming the line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fl_core::LogRecord;

use crate::RecordSource;

/// A journal file on disk.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonlSource {
    fn describe(&self) -> String {
        format!("journal {}", self.path.display())
    }

    fn load(&self) -> io::Result<Vec<LogRecord>> {
        let file = File::open(&self.path)?;
        let records = read_jsonl(BufReader::new(file))?;
        tracing::info!("Loaded {} records from {:?}", records.len(), self.path);
        Ok(records)
    }
}

/// Parses JSON-lines from any buffered reader.
pub fn read_jsonl<R: BufRead>(reader: R) -> io::Result<Vec<LogRecord>> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: LogRecord = serde_json::from_str(line).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line {}: {}", i + 1, e),
            )
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Writes `records` as JSON-lines, replacing `path`.
pub fn write_jsonl(path: &Path, records: &[LogRecord]) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}
