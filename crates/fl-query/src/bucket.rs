//! # Time-Bucketing Stage
//!
//! Turns a record set into a gapless series of [`TrendPoint`]s covering the
//! whole query window. Bucket width is picked by a [`BucketPolicy`] from the
//! window length; boundaries are aligned to UTC days, hours or half-hours.

use chrono::{DateTime, Duration, Utc};
use fl_core::{FieldId, LogRecord};
use serde::{Deserialize, Serialize};

use crate::model::TrendPoint;
use crate::window::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "hour")]
    Hour,
    #[serde(rename = "half-hour")]
    HalfHour,
}

impl Granularity {
    pub fn step_secs(self) -> i64 {
        match self {
            Granularity::Day => 86_400,
            Granularity::Hour => 3_600,
            Granularity::HalfHour => 1_800,
        }
    }

    /// Start of the bucket containing `ts`.
    pub fn truncate(self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let secs = ts.timestamp();
        let start = secs - secs.rem_euclid(self.step_secs());
        // Truncating an in-range instant stays in range.
        DateTime::from_timestamp(start, 0).unwrap_or(ts)
    }
}

/// Chooses bucket width from window length.
///
/// Windows longer than `day_threshold` get day buckets, windows longer than
/// `half_hour_threshold` get hour buckets, anything shorter gets half-hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPolicy {
    pub day_threshold: Duration,
    pub half_hour_threshold: Duration,
}

impl Default for BucketPolicy {
    fn default() -> Self {
        Self {
            day_threshold: Duration::hours(48),
            half_hour_threshold: Duration::hours(6),
        }
    }
}

impl BucketPolicy {
    /// `None` when either threshold overflows a `Duration`.
    pub fn from_hours(day_threshold_hours: i64, half_hour_threshold_hours: i64) -> Option<Self> {
        Some(Self {
            day_threshold: Duration::try_hours(day_threshold_hours)?,
            half_hour_threshold: Duration::try_hours(half_hour_threshold_hours)?,
        })
    }

    pub fn granularity(&self, window: &TimeWindow) -> Granularity {
        let span = window.span();
        if span > self.day_threshold {
            Granularity::Day
        } else if span > self.half_hour_threshold {
            Granularity::Hour
        } else {
            Granularity::HalfHour
        }
    }
}

/// Counts records per bucket across `window`, with an optional per-bucket
/// tally of `breakdown` values.
///
/// Every bucket between the one holding `window.from` and the one holding
/// `window.to` is present, empty or not. Records outside the window or
/// without a timestamp are ignored.
pub fn bucket_trend(
    records: &[&LogRecord],
    window: &TimeWindow,
    breakdown: Option<FieldId>,
    policy: &BucketPolicy,
) -> Vec<TrendPoint> {
    let granularity = policy.granularity(window);
    bucket_with(records, window, breakdown, granularity)
}

pub fn bucket_with(
    records: &[&LogRecord],
    window: &TimeWindow,
    breakdown: Option<FieldId>,
    granularity: Granularity,
) -> Vec<TrendPoint> {
    let step = granularity.step_secs();
    let first = granularity.truncate(window.from);
    let last = granularity.truncate(window.to);
    let buckets = ((last - first).num_seconds() / step + 1) as usize;

    let mut points: Vec<TrendPoint> = (0..buckets)
        .map(|i| TrendPoint {
            bucket_start: first + Duration::seconds(i as i64 * step),
            count: 0,
            breakdown: Default::default(),
        })
        .collect();

    for record in records {
        let Some(ts) = record.timestamp else { continue };
        if !window.contains(ts) {
            continue;
        }
        let idx = ((granularity.truncate(ts) - first).num_seconds() / step) as usize;
        let point = &mut points[idx];
        point.count += 1;
        if let Some(field) = breakdown {
            *point
                .breakdown
                .entry(record.label(field).into_owned())
                .or_insert(0) += 1;
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{parse_bound, Bound};
    use chrono::TimeZone;

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap()
    }

    fn days(from: &str, to: &str) -> TimeWindow {
        TimeWindow::new(
            parse_bound(from, Bound::Start).unwrap(),
            parse_bound(to, Bound::End).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_three_empty_days() {
        let window = days("2024-01-01", "2024-01-03");
        let points = bucket_trend(&[], &window, Some(FieldId::HostName), &BucketPolicy::default());
        assert_eq!(points.len(), 3);
        for (i, p) in points.iter().enumerate() {
            assert_eq!(p.bucket_start, utc(1 + i as u32, 0, 0));
            assert_eq!(p.count, 0);
            assert!(p.breakdown.is_empty());
        }
    }

    #[test]
    fn test_policy_tiers() {
        let policy = BucketPolicy::default();
        let w = |hours: i64| TimeWindow::new(utc(1, 0, 0), utc(1, 0, 0) + Duration::hours(hours)).unwrap();
        assert_eq!(policy.granularity(&w(72)), Granularity::Day);
        assert_eq!(policy.granularity(&w(48)), Granularity::Hour);
        assert_eq!(policy.granularity(&w(12)), Granularity::Hour);
        assert_eq!(policy.granularity(&w(6)), Granularity::HalfHour);
    }

    #[test]
    fn test_from_hours_rejects_overflow() {
        assert_eq!(BucketPolicy::from_hours(48, 6), Some(BucketPolicy::default()));
        assert_eq!(BucketPolicy::from_hours(i64::MAX, 6), None);
        assert_eq!(BucketPolicy::from_hours(48, i64::MIN), None);
    }

    #[test]
    fn test_counts_and_breakdown() {
        let mk = |d, h, host: &str| LogRecord {
            timestamp: Some(utc(d, h, 0)),
            host_name: Some(host.into()),
            ..LogRecord::default()
        };
        let rs = vec![mk(1, 3, "a"), mk(1, 20, "b"), mk(1, 21, "a"), mk(3, 0, "a"), mk(9, 0, "a")];
        let refs: Vec<&LogRecord> = rs.iter().collect();
        let window = days("2024-01-01", "2024-01-03");
        let points = bucket_trend(&refs, &window, Some(FieldId::HostName), &BucketPolicy::default());

        assert_eq!(points.iter().map(|p| p.count).collect::<Vec<_>>(), vec![3, 0, 1]);
        assert_eq!(points[0].breakdown["a"], 2);
        assert_eq!(points[0].breakdown["b"], 1);
        for p in &points {
            assert_eq!(p.breakdown.values().sum::<usize>(), p.count);
        }
    }

    #[test]
    fn test_half_hour_alignment_and_no_breakdown() {
        let window = TimeWindow::new(utc(1, 10, 10), utc(1, 11, 40)).unwrap();
        let rs = vec![LogRecord::at(utc(1, 10, 29)), LogRecord::at(utc(1, 10, 30)), LogRecord::at(utc(1, 10, 5))];
        let refs: Vec<&LogRecord> = rs.iter().collect();
        let points = bucket_trend(&refs, &window, None, &BucketPolicy::default());
        let starts: Vec<_> = points.iter().map(|p| p.bucket_start).collect();
        assert_eq!(starts, vec![utc(1, 10, 0), utc(1, 10, 30), utc(1, 11, 0), utc(1, 11, 30)]);
        // 10:05 precedes the window start.
        assert_eq!(points.iter().map(|p| p.count).collect::<Vec<_>>(), vec![1, 1, 0, 0]);
        assert!(points.iter().all(|p| p.breakdown.is_empty()));
    }

    #[test]
    fn test_missing_breakdown_value_uses_sentinel() {
        let window = days("2024-01-01", "2024-01-01");
        let rs = vec![LogRecord::at(utc(1, 5, 0))];
        let refs: Vec<&LogRecord> = rs.iter().collect();
        let points = bucket_with(&refs, &window, Some(FieldId::UserId), Granularity::Day);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].breakdown[fl_core::MISSING_LABEL], 1);
    }
}
