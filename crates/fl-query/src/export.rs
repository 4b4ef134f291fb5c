//! # Export Projector
//!
//! Flattens records into CSV-ready rows. Path-like columns keep only their
//! last segment, and cells are quoted per RFC 4180 when they need to be.

use fl_core::{FieldId, LogRecord};

/// Projected rows plus the columns they were projected on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub columns: Vec<FieldId>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn to_csv(&self) -> String {
        to_csv(&self.columns, &self.rows)
    }
}

/// One row per record, one cell per column, in column order.
pub fn project(records: &[&LogRecord], columns: &[FieldId]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| columns.iter().map(|&field| cell(record, field)).collect())
        .collect()
}

fn cell(record: &LogRecord, field: FieldId) -> String {
    let Some(text) = record.display(field) else {
        return String::new();
    };
    if field.is_hierarchical() {
        escape(last_segment(&text))
    } else {
        escape(&text)
    }
}

/// `"/Finance/Q1/Summary"` → `"Summary"`. Trailing separators are ignored.
pub fn last_segment(path: &str) -> &str {
    let is_sep = |c: char| c == '/' || c == '\\';
    let trimmed = path.trim_end_matches(is_sep);
    if trimmed.is_empty() {
        return path;
    }
    trimmed.rsplit(is_sep).next().unwrap_or(trimmed)
}

/// Quotes a cell if it holds a delimiter, quote or line break.
pub fn escape(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Header line of field ids followed by the rows.
pub fn to_csv(columns: &[FieldId], rows: &[Vec<String>]) -> String {
    let mut csv = columns
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(",");
    csv.push('\n');
    for row in rows {
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> LogRecord {
        LogRecord {
            host_name: Some("alpha".into()),
            path: Some("/opt/server/bin/".into()),
            report_name: Some("/Finance/Q1/Summary, \"final\"".into()),
            error_number: Some(500),
            message: Some("line one\nline two".into()),
            ..LogRecord::default()
        }
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("/Finance/Q1/Summary"), "Summary");
        assert_eq!(last_segment("C:\\apps\\srv"), "srv");
        assert_eq!(last_segment("/opt/server/"), "server");
        assert_eq!(last_segment("plain"), "plain");
        assert_eq!(last_segment("/"), "/");
    }

    #[test]
    fn test_project_column_order_and_transforms() {
        let r = record();
        let rows = project(
            &[&r],
            &[FieldId::ErrorNumber, FieldId::Path, FieldId::ReportName, FieldId::UserId, FieldId::Message],
        );
        assert_eq!(
            rows,
            vec![vec![
                "500".to_string(),
                "bin".to_string(),
                "\"Summary, \"\"final\"\"\"".to_string(),
                String::new(),
                "\"line one\nline two\"".to_string(),
            ]]
        );
    }

    #[test]
    fn test_csv_has_header() {
        let r = record();
        let columns = [FieldId::HostName, FieldId::ErrorNumber];
        let table = ExportTable {
            columns: columns.to_vec(),
            rows: project(&[&r, &r], &columns),
        };
        assert_eq!(table.to_csv(), "host_name,error_number\nalpha,500\nalpha,500\n");
    }
}
