//! Composable filtering of task record sets.
//!
//! All predicates are conjunctive and side-effect free, so [`apply`] is a
//! pure function: the same record set and the same criteria always produce
//! the same output, in the same order, in a single pass.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::model::TaskRecord;

/// The active filter state for one view of the task log.
///
/// Set-valued dimensions distinguish "no selection made" from "nothing
/// selected": `None` lets every observed value pass, while `Some` of an
/// empty set lets nothing pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Inclusive lower bound on the record's calendar date.
    pub date_from: Option<NaiveDate>,

    /// Inclusive upper bound on the record's calendar date.
    pub date_to: Option<NaiveDate>,

    /// Accepted statuses.
    pub statuses: Option<HashSet<String>>,

    /// Accepted task types.
    pub task_types: Option<HashSet<String>>,

    /// Accepted priorities.
    pub priorities: Option<HashSet<String>>,

    /// Accepted assignees.
    pub assignees: Option<HashSet<String>>,

    /// Accepted days of month (heatmap drill-down).
    pub days_of_month: Option<HashSet<u32>>,

    /// Accepted hours of day (heatmap drill-down).
    pub hours: Option<HashSet<u32>>,

    /// Free-text query, matched case-insensitively as a substring against
    /// task name, assignee, and task type. Empty matches everything.
    pub query: Option<String>,
}

impl FilterCriteria {
    /// Whether a single record passes every active predicate.
    pub fn matches(&self, record: &TaskRecord) -> bool {
        if let Some(from) = self.date_from {
            if record.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.date > to {
                return false;
            }
        }

        if !set_accepts(&self.statuses, Some(&record.status)) {
            return false;
        }
        if !set_accepts(&self.task_types, record.task_type.as_deref()) {
            return false;
        }
        if !set_accepts(&self.priorities, record.priority.as_deref()) {
            return false;
        }
        if !set_accepts(&self.assignees, record.assignee.as_deref()) {
            return false;
        }

        if let Some(days) = &self.days_of_month {
            if !days.contains(&record.day_of_month) {
                return false;
            }
        }
        if let Some(hours) = &self.hours {
            if !hours.contains(&record.hour_of_day) {
                return false;
            }
        }

        if let Some(query) = &self.query {
            if !query.is_empty() && !text_matches(record, query) {
                return false;
            }
        }

        true
    }
}

/// Set predicate for one string dimension.
///
/// `None` criteria accepts everything. With an active set, a record only
/// passes when its value is present and a member; a record that lacks the
/// field entirely cannot match an explicit selection.
fn set_accepts(accepted: &Option<HashSet<String>>, value: Option<&str>) -> bool {
    match accepted {
        None => true,
        Some(set) => match value {
            Some(v) => set.contains(v),
            None => false,
        },
    }
}

/// Case-insensitive substring match over task name, assignee, and task type.
fn text_matches(record: &TaskRecord, query: &str) -> bool {
    let needle = query.to_lowercase();

    [
        record.task_name.as_deref(),
        record.assignee.as_deref(),
        record.task_type.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Apply the criteria to a record set, preserving input order.
pub fn apply(records: &[TaskRecord], criteria: &FilterCriteria) -> Vec<TaskRecord> {
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn record(status: &str, ts: &str) -> TaskRecord {
        TaskRecord::new(
            status,
            NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
        )
    }

    fn sample() -> Vec<TaskRecord> {
        vec![
            record("Completed", "2024-01-01 08:00:00")
                .with_name("Boiler check")
                .with_task_type("Inspection")
                .with_priority("High")
                .with_assignee("Alice"),
            record("Missed", "2024-01-06 14:00:00")
                .with_name("Filter swap")
                .with_task_type("Maintenance")
                .with_priority("Low")
                .with_assignee("Bob"),
            record("Completed", "2024-01-07 09:00:00")
                .with_name("Lobby cleaning")
                .with_task_type("Cleaning")
                .with_priority("Medium")
                .with_assignee("Carol"),
        ]
    }

    #[test]
    fn test_no_criteria_passes_everything() {
        let records = sample();
        let filtered = apply(&records, &FilterCriteria::default());

        assert_eq!(filtered, records);
    }

    #[test]
    fn test_date_range_inclusive() {
        let records = sample();
        let criteria = FilterCriteria {
            date_from: Some(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()),
            date_to: Some(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()),
            ..FilterCriteria::default()
        };

        let filtered = apply(&records, &criteria);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].status, "Missed");
    }

    #[test]
    fn test_open_ended_date_range() {
        let records = sample();
        let criteria = FilterCriteria {
            date_from: Some(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()),
            ..FilterCriteria::default()
        };

        assert_eq!(apply(&records, &criteria).len(), 2);
    }

    #[test]
    fn test_empty_set_excludes_everything() {
        let records = sample();
        let criteria = FilterCriteria {
            statuses: Some(HashSet::new()),
            ..FilterCriteria::default()
        };

        assert!(apply(&records, &criteria).is_empty());
    }

    #[test]
    fn test_status_set() {
        let records = sample();
        let criteria = FilterCriteria {
            statuses: Some(HashSet::from(["Completed".to_string()])),
            ..FilterCriteria::default()
        };

        let filtered = apply(&records, &criteria);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.is_completed()));
    }

    #[test]
    fn test_text_query_across_fields() {
        let records = sample();

        // Matches assignee "Bob" case-insensitively
        let criteria = FilterCriteria {
            query: Some("bOb".to_string()),
            ..FilterCriteria::default()
        };
        let filtered = apply(&records, &criteria);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].assignee.as_deref(), Some("Bob"));

        // Matches task type substring
        let criteria = FilterCriteria {
            query: Some("clean".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&records, &criteria).len(), 1);

        // Empty query matches all
        let criteria = FilterCriteria {
            query: Some(String::new()),
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&records, &criteria).len(), 3);
    }

    #[test]
    fn test_record_without_field_fails_explicit_selection() {
        let records = vec![record("Completed", "2024-01-01 08:00:00")];
        let criteria = FilterCriteria {
            task_types: Some(HashSet::from(["Maintenance".to_string()])),
            ..FilterCriteria::default()
        };

        assert!(apply(&records, &criteria).is_empty());
    }

    #[test]
    fn test_idempotent_and_order_preserving() {
        let records = sample();
        let criteria = FilterCriteria {
            statuses: Some(HashSet::from([
                "Completed".to_string(),
                "Missed".to_string(),
            ])),
            ..FilterCriteria::default()
        };

        let once = apply(&records, &criteria);
        let twice = apply(&once, &criteria);
        assert_eq!(once, twice);

        // Survivors keep their input order
        let names: Vec<_> = once.iter().map(|r| r.task_name.as_deref()).collect();
        assert_eq!(
            names,
            vec![Some("Boiler check"), Some("Filter swap"), Some("Lobby cleaning")]
        );
    }

    #[test]
    fn test_heatmap_drilldown_dimensions() {
        let records = sample();
        let criteria = FilterCriteria {
            days_of_month: Some(HashSet::from([6, 7])),
            hours: Some(HashSet::from([14])),
            ..FilterCriteria::default()
        };

        let filtered = apply(&records, &criteria);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].day_of_month, 6);
    }
}
