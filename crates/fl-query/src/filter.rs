//! # Filter Stage
//!
//! AND across columns, order-preserving. Also home of the drill-down merge,
//! which folds clicked aggregate keys into an existing filter set.

use std::collections::BTreeMap;

use fl_core::{FieldId, LogRecord, MISSING_LABEL};

use crate::error::QueryError;
use crate::model::{ColumnFilters, FilterCondition, FilterOperator};
use crate::predicate::Predicate;

/// Keeps the records that satisfy every non-empty condition.
pub fn filter<'a, I>(records: I, filters: &ColumnFilters) -> Vec<&'a LogRecord>
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    let predicates: Vec<Predicate> = filters
        .iter()
        .filter(|(_, condition)| !condition.is_inert())
        .map(|(field, condition)| Predicate::new(*field, condition))
        .collect();

    records
        .into_iter()
        .filter(|record| predicates.iter().all(|p| p.matches(record)))
        .collect()
}

/// Folds drill-down keys into `base`.
///
/// Per column: no condition becomes `in [key]`; an `in` or `notIn` condition
/// is replaced by `in [key]`; an `and` condition gains the key as one more
/// required value. The key is the display text of a record that already
/// passed `base`, so replacing an `in` condition never widens the result.
pub fn merge_drill_down(
    base: &ColumnFilters,
    keys: &BTreeMap<FieldId, String>,
) -> Result<ColumnFilters, QueryError> {
    let mut merged = base.clone();
    for (field, key) in keys {
        if key == MISSING_LABEL {
            return Err(QueryError::MissingValueDrillDown(field.to_string()));
        }
        let narrowed = match merged.get(field) {
            Some(existing)
                if existing.operator == FilterOperator::ContainsAll && !existing.is_inert() =>
            {
                let mut values = existing.values.clone();
                values.push(key.clone());
                FilterCondition::new(FilterOperator::ContainsAll, values)
            }
            _ => FilterCondition::any_of([key.clone()]),
        };
        merged.insert(*field, narrowed);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<LogRecord> {
        let hosts = [
            "alpha-1", "beta-1", "alpha-2", "gamma", "ALPHA-3", "delta", "alpha-4", "beta-2",
            "alpha-5", "alphabet",
        ];
        hosts
            .iter()
            .enumerate()
            .map(|(i, h)| LogRecord {
                host_name: Some(h.to_string()),
                error_number: Some(if i % 2 == 0 { 500 } else { 404 }),
                ..LogRecord::default()
            })
            .collect()
    }

    #[test]
    fn test_empty_filter_set_is_identity() {
        let rs = records();
        let out = filter(&rs, &ColumnFilters::new());
        assert_eq!(out.len(), rs.len());
        assert!(out.iter().zip(rs.iter()).all(|(a, b)| std::ptr::eq(*a, b)));
    }

    #[test]
    fn test_six_alpha_hosts_in_order() {
        let rs = records();
        let mut filters = ColumnFilters::new();
        filters.insert(FieldId::HostName, FilterCondition::any_of(["alpha"]));
        let out = filter(&rs, &filters);
        let hosts: Vec<&str> = out.iter().map(|r| r.host_name.as_deref().unwrap()).collect();
        assert_eq!(
            hosts,
            vec!["alpha-1", "alpha-2", "ALPHA-3", "alpha-4", "alpha-5", "alphabet"]
        );
    }

    #[test]
    fn test_conditions_are_anded() {
        let rs = records();
        let mut filters = ColumnFilters::new();
        filters.insert(FieldId::HostName, FilterCondition::any_of(["alpha"]));
        filters.insert(FieldId::ErrorNumber, FilterCondition::any_of(["404"]));
        let out = filter(&rs, &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].host_name.as_deref(), Some("alphabet"));
    }

    #[test]
    fn test_inert_condition_is_skipped() {
        let rs = records();
        let mut filters = ColumnFilters::new();
        filters.insert(
            FieldId::HostName,
            FilterCondition::new(FilterOperator::In, Vec::<String>::new()),
        );
        assert_eq!(filter(&rs, &filters).len(), rs.len());
    }

    #[test]
    fn test_merge_into_empty_and_in() {
        let mut base = ColumnFilters::new();
        base.insert(FieldId::HostName, FilterCondition::any_of(["alpha", "beta"]));
        let mut keys = BTreeMap::new();
        keys.insert(FieldId::HostName, "alpha-2".to_string());
        keys.insert(FieldId::ErrorNumber, "500".to_string());
        let merged = merge_drill_down(&base, &keys).unwrap();
        assert_eq!(merged[&FieldId::HostName], FilterCondition::any_of(["alpha-2"]));
        assert_eq!(merged[&FieldId::ErrorNumber], FilterCondition::any_of(["500"]));
    }

    #[test]
    fn test_merge_appends_to_contains_all() {
        let mut base = ColumnFilters::new();
        base.insert(
            FieldId::Message,
            FilterCondition::new(FilterOperator::ContainsAll, ["timeout"]),
        );
        let mut keys = BTreeMap::new();
        keys.insert(FieldId::Message, "db timeout".to_string());
        let merged = merge_drill_down(&base, &keys).unwrap();
        assert_eq!(
            merged[&FieldId::Message],
            FilterCondition::new(FilterOperator::ContainsAll, ["timeout", "db timeout"])
        );
    }

    #[test]
    fn test_merge_rejects_missing_label() {
        let mut keys = BTreeMap::new();
        keys.insert(FieldId::UserId, MISSING_LABEL.to_string());
        assert_eq!(
            merge_drill_down(&ColumnFilters::new(), &keys),
            Err(QueryError::MissingValueDrillDown("user_id".into()))
        );
    }
}
