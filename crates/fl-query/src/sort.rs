//! # Sort Stage
//!
//! Stable, type-aware ordering on one column. Records missing the column go
//! to the end in both directions.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use fl_core::{FieldId, FieldValue, LogRecord};

use crate::model::{SortDirection, SortSpec};

/// Precomputed comparison key for one record.
#[derive(Debug)]
enum SortKey<'a> {
    Number(i64),
    Time(DateTime<Utc>),
    Text { folded: String, raw: &'a str },
}

impl<'a> SortKey<'a> {
    fn of(value: FieldValue<'a>) -> Self {
        match value {
            FieldValue::Number(n) => SortKey::Number(n),
            FieldValue::Time(t) => SortKey::Time(t),
            FieldValue::Text(raw) => SortKey::Text {
                folded: raw.to_lowercase(),
                raw,
            },
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.cmp(b),
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            (
                SortKey::Text { folded: fa, raw: ra },
                SortKey::Text { folded: fb, raw: rb },
            ) => fa.cmp(fb).then_with(|| ra.cmp(rb)),
            // A column has a single kind; mixed keys only order by kind.
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Time(_) => 1,
            SortKey::Text { .. } => 2,
        }
    }
}

/// Orders `records` by `spec` into a new vector.
pub fn sort<'a>(records: &[&'a LogRecord], spec: &SortSpec) -> Vec<&'a LogRecord> {
    let (field, direction) = spec.resolved();
    sort_by_field(records, field, direction)
}

pub fn sort_by_field<'a>(
    records: &[&'a LogRecord],
    field: FieldId,
    direction: SortDirection,
) -> Vec<&'a LogRecord> {
    let mut keyed: Vec<(Option<SortKey<'a>>, &'a LogRecord)> = records
        .iter()
        .map(|&record| (record.value(field).map(SortKey::of), record))
        .collect();

    // slice::sort_by is stable; ties keep input order.
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match direction {
            SortDirection::Ascending => a.cmp(b),
            SortDirection::Descending => b.cmp(a),
        },
    });

    keyed.into_iter().map(|(_, record)| record).collect()
}
