//! # Time Windows
//!
//! Resolves the two ways a caller can bound a query in time, an explicit
//! `{from, to}` pair or a relative interval such as `"7 days"`, into one
//! inclusive [`TimeWindow`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::QueryError;
use crate::model::DateRange;

/// Longest window or interval accepted, in seconds (roughly a century).
pub const MAX_WINDOW_SECS: i64 = 100 * 366 * 86_400;

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, QueryError> {
        if from > to {
            return Err(QueryError::MalformedWindow(format!(
                "from {} is after to {}",
                from.to_rfc3339(),
                to.to_rfc3339()
            )));
        }
        if (to - from).num_seconds() > MAX_WINDOW_SECS {
            return Err(QueryError::MalformedWindow(format!(
                "window {} .. {} is longer than {} days",
                from.to_rfc3339(),
                to.to_rfc3339(),
                MAX_WINDOW_SECS / 86_400
            )));
        }
        Ok(Self { from, to })
    }

    #[inline]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from <= ts && ts <= self.to
    }

    pub fn span(&self) -> Duration {
        self.to - self.from
    }
}

/// Which side of a window a calendar date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Turns the request's window or interval into a concrete window.
///
/// `Ok(None)` means the request is unbounded, which the engine answers with an
/// empty response instead of a full scan.
pub fn resolve(
    range: Option<&DateRange>,
    interval: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<TimeWindow>, QueryError> {
    let interval = interval.map(str::trim).filter(|s| !s.is_empty());
    match (range, interval) {
        (Some(_), Some(_)) => Err(QueryError::ConflictingWindow),
        (Some(range), None) => {
            let from = parse_bound(&range.from, Bound::Start)?;
            let to = parse_bound(&range.to, Bound::End)?;
            TimeWindow::new(from, to).map(Some)
        }
        (None, Some(raw)) => {
            let span = parse_interval(raw)?;
            TimeWindow::new(now - span, now).map(Some)
        }
        (None, None) => Ok(None),
    }
}

/// Parses an instant or a calendar date.
///
/// Calendar dates expand to the first or last nanosecond of that day (UTC)
/// depending on `bound`. Offset-less date-times are taken as UTC.
pub fn parse_bound(raw: &str, bound: Bound) -> Result<DateTime<Utc>, QueryError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(QueryError::MalformedWindow("empty bound".into()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| QueryError::MalformedWindow(format!("unrecognized instant '{}'", value)))?;
    let naive = match bound {
        Bound::Start => date.and_hms_opt(0, 0, 0),
        Bound::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
    }
    .ok_or_else(|| QueryError::MalformedWindow(format!("invalid date '{}'", value)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Parses `"7 days"`, `"24 hours"`, `"1 week"`, `"30m"`, `"2h"`, `"7d"`.
pub fn parse_interval(raw: &str) -> Result<Duration, QueryError> {
    let malformed = || QueryError::MalformedInterval(raw.to_string());
    let value = raw.trim().to_ascii_lowercase();
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(digits_end);
    let amount: i64 = number.parse().map_err(|_| malformed())?;
    if amount <= 0 {
        return Err(malformed());
    }

    let unit_secs = match unit.trim() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600,
        "d" | "day" | "days" => 86_400,
        "w" | "week" | "weeks" => 7 * 86_400,
        _ => return Err(malformed()),
    };
    let secs = amount
        .checked_mul(unit_secs)
        .filter(|s| *s <= MAX_WINDOW_SECS)
        .ok_or_else(malformed)?;
    Ok(Duration::seconds(secs))
}
