//! # Grouping Stage
//!
//! Builds a group-by forest. Each level partitions its records by one column
//! (missing values land under [`MISSING_LABEL`]) and recurses into the next
//! column of the path. Siblings are ordered by count, largest first, with ties
//! in first-seen order.
//!
//! [`MISSING_LABEL`]: fl_core::MISSING_LABEL

use std::collections::HashMap;

use fl_core::{FieldId, LogRecord};

use crate::model::GroupNode;

/// Groups `records` along `path`. An empty path yields an empty forest.
pub fn group(records: &[&LogRecord], path: &[FieldId]) -> Vec<GroupNode> {
    let Some((&field, rest)) = path.split_first() else {
        return Vec::new();
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut partitions: Vec<(String, Vec<&LogRecord>)> = Vec::new();
    for &record in records {
        let key = record.label(field).into_owned();
        let slot = *index.entry(key).or_insert_with_key(|key| {
            partitions.push((key.clone(), Vec::new()));
            partitions.len() - 1
        });
        partitions[slot].1.push(record);
    }

    let mut nodes: Vec<GroupNode> = partitions
        .into_iter()
        .map(|(key, members)| GroupNode {
            key,
            count: members.len(),
            subgroups: group(&members, rest),
        })
        .collect();
    // Stable: equal counts stay in first-seen order.
    nodes.sort_by(|a, b| b.count.cmp(&a.count));
    nodes
}

/// Number of records represented by a forest.
pub fn forest_total(forest: &[GroupNode]) -> usize {
    forest.iter().map(|node| node.count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fl_core::MISSING_LABEL;

    fn rec(host: &str, code: i64) -> LogRecord {
        LogRecord {
            host_name: Some(host.into()),
            error_number: Some(code),
            ..LogRecord::default()
        }
    }

    fn node(key: &str, count: usize, subgroups: Vec<GroupNode>) -> GroupNode {
        GroupNode {
            key: key.into(),
            count,
            subgroups,
        }
    }

    #[test]
    fn test_empty_path_is_empty_forest() {
        let rs = vec![rec("A", 500)];
        let refs: Vec<&LogRecord> = rs.iter().collect();
        assert!(group(&refs, &[]).is_empty());
    }

    #[test]
    fn test_two_level_grouping() {
        let rs = vec![
            rec("B", 500),
            rec("A", 500),
            rec("A", 404),
            rec("B", 500),
            rec("A", 500),
        ];
        let refs: Vec<&LogRecord> = rs.iter().collect();
        let forest = group(&refs, &[FieldId::HostName, FieldId::ErrorNumber]);
        assert_eq!(
            forest,
            vec![
                node("A", 3, vec![node("500", 2, vec![]), node("404", 1, vec![])]),
                node("B", 2, vec![node("500", 2, vec![])]),
            ]
        );
        assert_eq!(forest_total(&forest), 5);
        for n in &forest {
            assert_eq!(n.leaf_total(), n.count);
        }
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let rs = vec![rec("z", 1), rec("y", 1), rec("x", 1)];
        let refs: Vec<&LogRecord> = rs.iter().collect();
        let keys: Vec<String> = group(&refs, &[FieldId::HostName])
            .into_iter()
            .map(|n| n.key)
            .collect();
        assert_eq!(keys, vec!["z", "y", "x"]);
    }

    #[test]
    fn test_missing_values_share_sentinel_group() {
        let rs = vec![
            LogRecord::default(),
            rec("A", 1),
            LogRecord {
                host_name: Some(String::new()),
                ..LogRecord::default()
            },
        ];
        let refs: Vec<&LogRecord> = rs.iter().collect();
        let forest = group(&refs, &[FieldId::HostName]);
        assert_eq!(forest[0], node(MISSING_LABEL, 2, vec![]));
        assert_eq!(forest[1], node("A", 1, vec![]));
    }

    #[test]
    fn test_three_levels_sum_at_every_depth() {
        let rs: Vec<LogRecord> = (0..30)
            .map(|i| LogRecord {
                host_name: Some(format!("h{}", i % 3)),
                error_number: Some(400 + (i % 4)),
                user_id: Some(format!("u{}", i % 5)),
                ..LogRecord::default()
            })
            .collect();
        let refs: Vec<&LogRecord> = rs.iter().collect();
        let forest = group(
            &refs,
            &[FieldId::HostName, FieldId::ErrorNumber, FieldId::UserId],
        );
        fn check(n: &GroupNode) {
            if !n.subgroups.is_empty() {
                assert_eq!(n.subgroups.iter().map(|s| s.count).sum::<usize>(), n.count);
                n.subgroups.iter().for_each(check);
            }
        }
        forest.iter().for_each(check);
        assert_eq!(forest_total(&forest), 30);
    }
}
