//! Query flags shared by every subcommand that talks to `/api/logs/*`.

use std::collections::BTreeMap;

use clap::Args;
use fl_core::FieldId;
use fl_query::{
    ColumnFilters, DateRange, FilterCondition, FilterOperator, Pagination, QueryRequest,
    SortDirection, SortSpec,
};

/// Relative window used when no window flags are given.
pub const DEFAULT_INTERVAL: &str = "24 hours";

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Relative window ending now, e.g. "7 days" or "90m".
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub interval: Option<String>,

    /// Window start (RFC 3339 instant or YYYY-MM-DD).
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Window end (RFC 3339 instant or YYYY-MM-DD, inclusive).
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Column filter as field:op:v1,v2 with op one of in, notin, and.
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(FieldId, FilterCondition)>,

    /// Sort column, optionally suffixed with :asc or :desc.
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<SortSpec>,

    #[arg(long)]
    pub page: Option<i64>,

    #[arg(long)]
    pub page_size: Option<i64>,
}

impl QueryArgs {
    pub fn to_request(&self) -> Result<QueryRequest, String> {
        let mut filters = ColumnFilters::new();
        for (field, condition) in &self.filters {
            if filters.insert(*field, condition.clone()).is_some() {
                return Err(format!("more than one --filter for '{}'", field));
            }
        }

        let (time_window, interval) = match (&self.from, &self.to, &self.interval) {
            (Some(from), Some(to), _) => (
                Some(DateRange {
                    from: from.clone(),
                    to: to.clone(),
                }),
                None,
            ),
            (_, _, Some(interval)) => (None, Some(interval.clone())),
            _ => (None, Some(DEFAULT_INTERVAL.to_string())),
        };

        let pagination = match (self.page, self.page_size) {
            (None, None) => None,
            (page, size) => Some(Pagination {
                page: page.unwrap_or(1),
                page_size: size.unwrap_or(fl_query::model::DEFAULT_PAGE_SIZE),
            }),
        };

        Ok(QueryRequest {
            request_id: format!("fl-{}", uuid::Uuid::new_v4().as_simple()),
            time_window,
            interval,
            pagination,
            sort: self.sort,
            filters,
            group_by: Vec::new(),
            breakdown_field: None,
        })
    }
}

/// `host_name:in:alpha,beta` → `(HostName, in [alpha, beta])`.
pub fn parse_filter(raw: &str) -> Result<(FieldId, FilterCondition), String> {
    let mut parts = raw.splitn(3, ':');
    let (Some(field), Some(op), Some(values)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected field:op:values, got '{}'", raw));
    };
    let field: FieldId = field.parse().map_err(|e| format!("{}", e))?;
    let operator = match op.trim().to_ascii_lowercase().as_str() {
        "in" => FilterOperator::In,
        "notin" | "not_in" | "not-in" => FilterOperator::NotIn,
        "and" | "all" => FilterOperator::ContainsAll,
        other => return Err(format!("unknown operator '{}' (use in, notin or and)", other)),
    };
    let values: Vec<&str> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(format!("filter on '{}' has no values", field));
    }
    Ok((field, FilterCondition::new(operator, values)))
}

/// `error_number:desc` → descending on error number. A bare field sorts
/// ascending.
pub fn parse_sort(raw: &str) -> Result<SortSpec, String> {
    let (field, direction) = match raw.rsplit_once(':') {
        Some((field, dir)) => {
            let direction = match dir.trim().to_ascii_lowercase().as_str() {
                "asc" | "ascending" => SortDirection::Ascending,
                "desc" | "descending" => SortDirection::Descending,
                other => return Err(format!("unknown sort direction '{}'", other)),
            };
            (field, direction)
        }
        None => (raw, SortDirection::Ascending),
    };
    let field: FieldId = field.parse().map_err(|e| format!("{}", e))?;
    Ok(SortSpec::by(field, direction))
}

/// `host_name=alpha-1` pairs for drill-down keys.
pub fn parse_key(raw: &str) -> Result<(FieldId, String), String> {
    let (field, key) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))?;
    let field: FieldId = field.parse().map_err(|e| format!("{}", e))?;
    Ok((field, key.to_string()))
}

pub fn keys_map(keys: &[(FieldId, String)]) -> BTreeMap<FieldId, String> {
    keys.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        let (field, cond) = parse_filter("host_name:in:alpha, beta,alpha").unwrap();
        assert_eq!(field, FieldId::HostName);
        assert_eq!(cond.operator, FilterOperator::In);
        assert_eq!(cond.values, vec!["alpha", "beta"]);

        let (_, cond) = parse_filter("message:NOTIN:timeout").unwrap();
        assert_eq!(cond.operator, FilterOperator::NotIn);

        // Values may contain colons.
        let (_, cond) = parse_filter("message:and:a:b,c").unwrap();
        assert_eq!(cond.operator, FilterOperator::ContainsAll);
        assert_eq!(cond.values, vec!["a:b", "c"]);
    }

    #[test]
    fn test_parse_filter_rejects_bad_input() {
        assert!(parse_filter("host_name").is_err());
        assert!(parse_filter("hostname:in:a").is_err());
        assert!(parse_filter("host_name:like:a").is_err());
        assert!(parse_filter("host_name:in: , ").is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(
            parse_sort("error_number:desc").unwrap(),
            SortSpec::by(FieldId::ErrorNumber, SortDirection::Descending)
        );
        assert_eq!(
            parse_sort("port").unwrap(),
            SortSpec::by(FieldId::Port, SortDirection::Ascending)
        );
        assert!(parse_sort("port:sideways").is_err());
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(
            parse_key("report_name=/Finance/Q1").unwrap(),
            (FieldId::ReportName, "/Finance/Q1".to_string())
        );
        assert!(parse_key("report_name").is_err());
    }

    #[test]
    fn test_request_defaults_to_last_day() {
        let request = QueryArgs::default().to_request().unwrap();
        assert_eq!(request.interval.as_deref(), Some(DEFAULT_INTERVAL));
        assert!(request.time_window.is_none());
        assert!(request.pagination.is_none());
        assert!(request.request_id.starts_with("fl-"));
    }

    #[test]
    fn test_request_window_and_pagination() {
        let args = QueryArgs {
            from: Some("2024-01-01".into()),
            to: Some("2024-01-03".into()),
            page_size: Some(10),
            ..QueryArgs::default()
        };
        let request = args.to_request().unwrap();
        assert!(request.interval.is_none());
        assert_eq!(request.time_window.unwrap().to, "2024-01-03");
        assert_eq!(request.pagination, Some(Pagination { page: 1, page_size: 10 }));
    }

    #[test]
    fn test_duplicate_filter_field_is_error() {
        let args = QueryArgs {
            filters: vec![
                parse_filter("host_name:in:a").unwrap(),
                parse_filter("host_name:notin:b").unwrap(),
            ],
            ..QueryArgs::default()
        };
        assert!(args.to_request().is_err());
    }
}
