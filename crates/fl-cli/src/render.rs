//! Terminal rendering for hub responses.

use fl_core::{FieldId, LogRecord};
use fl_query::export::last_segment;
use fl_query::{GroupNode, TrendPoint};
use serde::Deserialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

const MESSAGE_WIDTH: usize = 60;

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Error")]
    error: String,
    #[tabled(rename = "Report")]
    report: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&LogRecord> for LogRow {
    fn from(record: &LogRecord) -> Self {
        Self {
            timestamp: record.label(FieldId::Timestamp).into_owned(),
            host: record.label(FieldId::HostName).into_owned(),
            error: record.label(FieldId::ErrorNumber).into_owned(),
            report: last_segment(&record.label(FieldId::ReportName)).to_string(),
            user: record.label(FieldId::UserId).into_owned(),
            message: truncate(&record.label(FieldId::Message), MESSAGE_WIDTH),
        }
    }
}

pub fn logs_table(logs: &[LogRecord]) -> String {
    let rows: Vec<LogRow> = logs.iter().map(LogRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// "page 2 of 7 (312 records)"
pub fn page_footer(page: i64, page_size: i64, total: usize) -> String {
    let pages = fl_query::paginate::page_count(total, page_size).max(1);
    format!("page {} of {} ({} records)", page, pages, total)
}

/// One line per node, children indented under their parent.
pub fn group_tree(nodes: &[GroupNode]) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes, 0);
    out
}

fn write_nodes(out: &mut String, nodes: &[GroupNode], depth: usize) {
    for node in nodes {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{} ({})\n", node.key, node.count));
        write_nodes(out, &node.subgroups, depth + 1);
    }
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Bucket")]
    bucket: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Breakdown")]
    breakdown: String,
}

pub fn trend_table(points: &[TrendPoint]) -> String {
    let rows: Vec<TrendRow> = points
        .iter()
        .map(|p| TrendRow {
            bucket: p.bucket_start.format("%Y-%m-%d %H:%M").to_string(),
            count: p.count,
            breakdown: p
                .breakdown
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// One entry of `GET /api/fields`.
#[derive(Deserialize, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Id")]
    pub id: String,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Hierarchical")]
    pub hierarchical: bool,
}

pub fn fields_table(fields: Vec<FieldRow>) -> String {
    Table::new(fields).with(Style::rounded()).to_string()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
