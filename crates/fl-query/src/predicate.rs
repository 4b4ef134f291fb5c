//! # Predicate Evaluator
//!
//! Matching is case-insensitive substring search against the field's display
//! text, so `in ["alpha"]` keeps `ALPHA-01` and `alpha-west`.

use fl_core::{FieldId, LogRecord};

use crate::model::{FilterCondition, FilterOperator};

/// A [`FilterCondition`] bound to its column, with values pre-folded.
#[derive(Debug, Clone)]
pub struct Predicate {
    field: FieldId,
    operator: FilterOperator,
    needles: Vec<String>,
}

impl Predicate {
    pub fn new(field: FieldId, condition: &FilterCondition) -> Self {
        Self {
            field,
            operator: condition.operator,
            needles: condition.values.iter().map(|v| v.to_lowercase()).collect(),
        }
    }

    pub fn field(&self) -> FieldId {
        self.field
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        let Some(text) = record.display(self.field) else {
            // "contains none of" holds vacuously for a missing value.
            return self.operator == FilterOperator::NotIn;
        };
        let haystack = text.to_lowercase();
        let mut needles = self.needles.iter();
        match self.operator {
            FilterOperator::In => needles.any(|n| haystack.contains(n.as_str())),
            FilterOperator::NotIn => !needles.any(|n| haystack.contains(n.as_str())),
            FilterOperator::ContainsAll => needles.all(|n| haystack.contains(n.as_str())),
        }
    }
}

/// Evaluates one condition against one record.
pub fn matches(record: &LogRecord, field: FieldId, condition: &FilterCondition) -> bool {
    Predicate::new(field, condition).matches(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str) -> LogRecord {
        LogRecord {
            host_name: Some(name.into()),
            error_number: Some(500),
            ..LogRecord::default()
        }
    }

    fn cond(operator: FilterOperator, values: &[&str]) -> FilterCondition {
        FilterCondition::new(operator, values.iter().copied())
    }

    #[test]
    fn test_in_is_case_insensitive_substring() {
        let c = cond(FilterOperator::In, &["alpha", "gamma"]);
        assert!(matches(&host("ALPHA-01"), FieldId::HostName, &c));
        assert!(matches(&host("eu-gamma"), FieldId::HostName, &c));
        assert!(!matches(&host("beta"), FieldId::HostName, &c));
    }

    #[test]
    fn test_not_in_excludes_any_hit() {
        let c = cond(FilterOperator::NotIn, &["alp", "bet"]);
        assert!(!matches(&host("alpha"), FieldId::HostName, &c));
        assert!(!matches(&host("Beta"), FieldId::HostName, &c));
        assert!(matches(&host("gamma"), FieldId::HostName, &c));
    }

    #[test]
    fn test_contains_all_needs_every_value() {
        let c = cond(FilterOperator::ContainsAll, &["prod", "east"]);
        assert!(matches(&host("prod-east-3"), FieldId::HostName, &c));
        assert!(!matches(&host("prod-west-3"), FieldId::HostName, &c));
    }

    #[test]
    fn test_numeric_fields_match_on_text() {
        let c = cond(FilterOperator::In, &["50"]);
        assert!(matches(&host("x"), FieldId::ErrorNumber, &c));
        let c = cond(FilterOperator::In, &["404"]);
        assert!(!matches(&host("x"), FieldId::ErrorNumber, &c));
    }

    #[test]
    fn test_missing_value_semantics() {
        let r = LogRecord::default();
        assert!(!matches(&r, FieldId::UserId, &cond(FilterOperator::In, &["a"])));
        assert!(!matches(&r, FieldId::UserId, &cond(FilterOperator::ContainsAll, &["a"])));
        assert!(matches(&r, FieldId::UserId, &cond(FilterOperator::NotIn, &["a"])));
    }
}
