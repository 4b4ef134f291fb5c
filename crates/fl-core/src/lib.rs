//! # fl-core: The "Record" of FAULTLINE
//!
//! Defines the shape of a single error-log entry and the closed set of
//! column identifiers the query engine can filter, sort, group and bucket by.
//!
//! Field access never goes through strings at runtime. Every [`FieldId`]
//! resolves to a [`FieldDescriptor`] in a static accessor table, and the
//! descriptor knows how to pull a typed [`FieldValue`] out of a [`LogRecord`].

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used wherever a missing value has to be shown or grouped.
pub const MISSING_LABEL: &str = "N/A";

/// Display format for instants. Also the text that filters match against.
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// LogRecord
// =============================================================================

/// One error-log entry.
///
/// Every field is optional: sources are expected to fill all of them, but the
/// engine tolerates absent values and treats an empty string as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// Install path of the server process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Report path, e.g. `/Finance/Quarterly/Summary`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LogRecord {
    /// A record with only its timestamp set.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }

    /// Typed value of `field`, or `None` when missing.
    #[inline]
    pub fn value(&self, field: FieldId) -> Option<FieldValue<'_>> {
        (field.descriptor().accessor)(self)
    }

    /// Display text of `field`, or `None` when missing.
    pub fn display(&self, field: FieldId) -> Option<Cow<'_, str>> {
        self.value(field).map(|v| v.display_text())
    }

    /// Display text of `field`, with missing values replaced by [`MISSING_LABEL`].
    pub fn label(&self, field: FieldId) -> Cow<'_, str> {
        self.display(field)
            .unwrap_or(Cow::Borrowed(MISSING_LABEL))
    }
}

// =============================================================================
// Field identifiers
// =============================================================================

/// Stable identifier for one column of a [`LogRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Timestamp,
    HostName,
    Path,
    Port,
    Version,
    ServerMode,
    ServerStart,
    ConfigName,
    UserId,
    ReportName,
    ErrorNumber,
    QueryId,
    Message,
}

impl FieldId {
    /// Every field, in table order.
    pub const ALL: [FieldId; 13] = [
        FieldId::Timestamp,
        FieldId::HostName,
        FieldId::Path,
        FieldId::Port,
        FieldId::Version,
        FieldId::ServerMode,
        FieldId::ServerStart,
        FieldId::ConfigName,
        FieldId::UserId,
        FieldId::ReportName,
        FieldId::ErrorNumber,
        FieldId::QueryId,
        FieldId::Message,
    ];

    /// The accessor-table entry for this field.
    #[inline]
    pub fn descriptor(self) -> &'static FieldDescriptor {
        // Table order matches declaration order.
        &FIELD_TABLE[self as usize]
    }

    /// Wire identifier (`host_name`, `error_number`, ...).
    pub fn as_str(self) -> &'static str {
        self.descriptor().name
    }

    pub fn kind(self) -> FieldKind {
        self.descriptor().kind
    }

    /// Whether values are `/`-separated paths.
    pub fn is_hierarchical(self) -> bool {
        self.descriptor().hierarchical
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown field identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field '{}'", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for FieldId {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FIELD_TABLE
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(wanted))
            .map(|d| d.id)
            .ok_or_else(|| UnknownField(wanted.to_string()))
    }
}

// =============================================================================
// Field values
// =============================================================================

/// Storage class of a field. Drives comparison in the sort stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Time,
}

/// A borrowed, typed view of one field of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(i64),
    Time(DateTime<Utc>),
}

impl<'a> FieldValue<'a> {
    /// The textual form used for display, filtering, grouping and export.
    pub fn display_text(&self) -> Cow<'a, str> {
        match *self {
            FieldValue::Text(s) => Cow::Borrowed(s),
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
            FieldValue::Time(t) => Cow::Owned(t.format(TIMESTAMP_DISPLAY_FORMAT).to_string()),
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

// =============================================================================
// Accessor table
// =============================================================================

/// Static description of one column.
pub struct FieldDescriptor {
    pub id: FieldId,
    /// Wire identifier.
    pub name: &'static str,
    /// Human-readable column title.
    pub label: &'static str,
    pub kind: FieldKind,
    pub hierarchical: bool,
    accessor: fn(&LogRecord) -> Option<FieldValue<'_>>,
}

impl FieldDescriptor {
    #[inline]
    pub fn get<'r>(&self, record: &'r LogRecord) -> Option<FieldValue<'r>> {
        (self.accessor)(record)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("hierarchical", &self.hierarchical)
            .finish()
    }
}

fn text(value: &Option<String>) -> Option<FieldValue<'_>> {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(FieldValue::Text)
}

fn get_timestamp(r: &LogRecord) -> Option<FieldValue<'_>> {
    r.timestamp.map(FieldValue::Time)
}
fn get_host_name(r: &LogRecord) -> Option<FieldValue<'_>> {
    text(&r.host_name)
}
fn get_path(r: &LogRecord) -> Option<FieldValue<'_>> {
    text(&r.path)
}
fn get_port(r: &LogRecord) -> Option<FieldValue<'_>> {
    r.port.map(FieldValue::Number)
}
fn get_version(r: &LogRecord) -> Option<FieldValue<'_>> {
    text(&r.version)
}
fn get_server_mode(r: &LogRecord) -> Option<FieldValue<'_>> {
    text(&r.server_mode)
}
fn get_server_start(r: &LogRecord) -> Option<FieldValue<'_>> {
    r.server_start.map(FieldValue::Time)
}
fn get_config_name(r: &LogRecord) -> Option<FieldValue<'_>> {
    text(&r.config_name)
}
fn get_user_id(r: &LogRecord) -> Option<FieldValue<'_>> {
    text(&r.user_id)
}
fn get_report_name(r: &LogRecord) -> Option<FieldValue<'_>> {
    text(&r.report_name)
}
fn get_error_number(r: &LogRecord) -> Option<FieldValue<'_>> {
    r.error_number.map(FieldValue::Number)
}
fn get_query_id(r: &LogRecord) -> Option<FieldValue<'_>> {
    text(&r.query_id)
}
fn get_message(r: &LogRecord) -> Option<FieldValue<'_>> {
    text(&r.message)
}

const fn field(
    id: FieldId,
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    hierarchical: bool,
    accessor: fn(&LogRecord) -> Option<FieldValue<'_>>,
) -> FieldDescriptor {
    FieldDescriptor {
        id,
        name,
        label,
        kind,
        hierarchical,
        accessor,
    }
}

static FIELD_TABLE: [FieldDescriptor; 13] = [
    field(FieldId::Timestamp, "timestamp", "Timestamp", FieldKind::Time, false, get_timestamp),
    field(FieldId::HostName, "host_name", "Host", FieldKind::Text, false, get_host_name),
    field(FieldId::Path, "path", "Path", FieldKind::Text, true, get_path),
    field(FieldId::Port, "port", "Port", FieldKind::Number, false, get_port),
    field(FieldId::Version, "version", "Version", FieldKind::Text, false, get_version),
    field(FieldId::ServerMode, "server_mode", "Server Mode", FieldKind::Text, false, get_server_mode),
    field(FieldId::ServerStart, "server_start", "Server Start", FieldKind::Time, false, get_server_start),
    field(FieldId::ConfigName, "config_name", "Config", FieldKind::Text, false, get_config_name),
    field(FieldId::UserId, "user_id", "User", FieldKind::Text, false, get_user_id),
    field(FieldId::ReportName, "report_name", "Report", FieldKind::Text, true, get_report_name),
    field(FieldId::ErrorNumber, "error_number", "Error #", FieldKind::Number, false, get_error_number),
    field(FieldId::QueryId, "query_id", "Query ID", FieldKind::Text, false, get_query_id),
    field(FieldId::Message, "message", "Message", FieldKind::Text, false, get_message),
];

/// The full accessor table, in [`FieldId::ALL`] order.
pub fn field_table() -> &'static [FieldDescriptor] {
    &FIELD_TABLE
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> LogRecord {
        LogRecord {
            timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()),
            host_name: Some("alpha-01".into()),
            port: Some(8080),
            error_number: Some(500),
            message: Some(String::new()),
            ..LogRecord::default()
        }
    }

    #[test]
    fn test_table_order_matches_enum() {
        for (i, id) in FieldId::ALL.iter().enumerate() {
            assert_eq!(field_table()[i].id, *id);
            assert_eq!(id.descriptor().id, *id);
        }
    }

    #[test]
    fn test_display_text_per_kind() {
        let r = sample();
        assert_eq!(r.display(FieldId::HostName).unwrap(), "alpha-01");
        assert_eq!(r.display(FieldId::Port).unwrap(), "8080");
        assert_eq!(r.display(FieldId::Timestamp).unwrap(), "2024-03-05 14:07:09");
    }

    #[test]
    fn test_empty_string_is_missing() {
        let r = sample();
        assert!(r.value(FieldId::Message).is_none());
        assert!(r.value(FieldId::UserId).is_none());
        assert_eq!(r.label(FieldId::Message), MISSING_LABEL);
    }

    #[test]
    fn test_field_id_parse_and_wire_name() {
        assert_eq!("error_number".parse::<FieldId>().unwrap(), FieldId::ErrorNumber);
        assert_eq!("HOST_NAME".parse::<FieldId>().unwrap(), FieldId::HostName);
        assert!("hostname".parse::<FieldId>().is_err());
        let json = serde_json::to_string(&FieldId::ServerStart).unwrap();
        assert_eq!(json, "\"server_start\"");
    }

    #[test]
    fn test_hierarchical_fields() {
        let hierarchical: Vec<FieldId> = FieldId::ALL
            .iter()
            .copied()
            .filter(|f| f.is_hierarchical())
            .collect();
        assert_eq!(hierarchical, vec![FieldId::Path, FieldId::ReportName]);
    }

    #[test]
    fn test_record_roundtrips_through_json_with_missing_fields() {
        let json = r#"{"host_name":"beta","error_number":404}"#;
        let r: LogRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.host_name.as_deref(), Some("beta"));
        assert_eq!(r.error_number, Some(404));
        assert!(r.timestamp.is_none());
        assert_eq!(serde_json::to_string(&r).unwrap(), json);
    }
}
