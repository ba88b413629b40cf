//! Data models for Taskpulse.
//!
//! The central type is [`TaskRecord`]: one maintenance task occurrence with
//! its calendar and status fields derived exactly once, in the constructor.
//! Every page-level computation (filtering, trends, the heatmap) reads the
//! derived fields from here, so the weekend cutoff and the missed-detection
//! rule cannot drift between views.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::filter::FilterCriteria;
use crate::todo::{TodoPriority, TodoStatus};

/// One maintenance task occurrence from the facility task log.
///
/// All derived fields are pure functions of `timestamp` and `status`,
/// computed in [`TaskRecord::new`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Human-readable task name, when the log carries one.
    pub task_name: Option<String>,

    /// Identifier of the facility the task belongs to.
    pub facility_id: Option<String>,

    /// Task category such as "Maintenance" or "Inspection".
    pub task_type: Option<String>,

    /// Raw status string from the log ("Completed", "Missed", "In Progress", ...).
    ///
    /// Kept verbatim; [`TaskRecord::is_missed`] is the one place that
    /// interprets it.
    pub status: String,

    /// Priority label ("High", "Medium", "Low"), when present.
    pub priority: Option<String>,

    /// Person the task is assigned to.
    pub assignee: Option<String>,

    /// Scheduled date and time of the task. Required; a row without a
    /// parseable timestamp fails the whole load.
    pub timestamp: NaiveDateTime,

    /// Estimated workload in hours, when the log carries it.
    pub workload_estimate: Option<f64>,

    /// How many times per week the task recurs, when the log carries it.
    pub task_frequency: Option<u32>,

    /// Calendar date of `timestamp`.
    pub date: NaiveDate,

    /// Hour of day, 0-23.
    pub hour_of_day: u32,

    /// Day of week, 0-6 with Monday = 0.
    pub day_of_week: u32,

    /// Day of month, 1-31.
    pub day_of_month: u32,

    /// True iff `day_of_week >= 5` (Saturday or Sunday).
    pub is_weekend: bool,

    /// True iff `status` equals "missed" case-insensitively.
    pub is_missed: bool,
}

impl TaskRecord {
    /// Create a record and derive its calendar and status fields.
    pub fn new(status: &str, timestamp: NaiveDateTime) -> Self {
        let day_of_week = timestamp.weekday().num_days_from_monday();

        Self {
            task_name: None,
            facility_id: None,
            task_type: None,
            status: status.to_string(),
            priority: None,
            assignee: None,
            timestamp,
            workload_estimate: None,
            task_frequency: None,
            date: timestamp.date(),
            hour_of_day: timestamp.hour(),
            day_of_week,
            day_of_month: timestamp.day(),
            is_weekend: day_of_week >= 5,
            is_missed: status.eq_ignore_ascii_case("missed"),
        }
    }

    /// Set the task name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.task_name = Some(name.to_string());
        self
    }

    /// Set the facility id.
    pub fn with_facility(mut self, facility_id: &str) -> Self {
        self.facility_id = Some(facility_id.to_string());
        self
    }

    /// Set the task type.
    pub fn with_task_type(mut self, task_type: &str) -> Self {
        self.task_type = Some(task_type.to_string());
        self
    }

    /// Set the priority label.
    pub fn with_priority(mut self, priority: &str) -> Self {
        self.priority = Some(priority.to_string());
        self
    }

    /// Set the assignee.
    pub fn with_assignee(mut self, assignee: &str) -> Self {
        self.assignee = Some(assignee.to_string());
        self
    }

    /// Set the workload estimate in hours.
    pub fn with_workload(mut self, hours: f64) -> Self {
        self.workload_estimate = Some(hours);
        self
    }

    /// Set the weekly task frequency.
    pub fn with_frequency(mut self, per_week: u32) -> Self {
        self.task_frequency = Some(per_week);
        self
    }

    /// Whether the task completed (status "Completed", case-insensitive).
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }
}

/// Query parameters accepted by `GET /summary`, `GET /records`, and
/// `GET /export`.
///
/// Set-valued dimensions are comma-separated lists. An *absent* parameter
/// means "all observed values pass"; a *present but empty* parameter means
/// "nothing selected, nothing passes".
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    /// Inclusive lower date bound (YYYY-MM-DD).
    pub from: Option<NaiveDate>,

    /// Inclusive upper date bound (YYYY-MM-DD).
    pub to: Option<NaiveDate>,

    /// Accepted statuses, comma-separated.
    pub status: Option<String>,

    /// Accepted task types, comma-separated.
    pub task_type: Option<String>,

    /// Accepted priorities, comma-separated.
    pub priority: Option<String>,

    /// Accepted assignees, comma-separated.
    pub assignee: Option<String>,

    /// Accepted days of month, comma-separated (heatmap drill-down).
    pub day: Option<String>,

    /// Accepted hours of day, comma-separated (heatmap drill-down).
    pub hour: Option<String>,

    /// Free-text query matched case-insensitively against task name,
    /// assignee, and task type.
    pub q: Option<String>,
}

impl FilterQuery {
    /// Build the filter criteria this query describes.
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            date_from: self.from,
            date_to: self.to,
            statuses: self.status.as_deref().map(split_set),
            task_types: self.task_type.as_deref().map(split_set),
            priorities: self.priority.as_deref().map(split_set),
            assignees: self.assignee.as_deref().map(split_set),
            days_of_month: self.day.as_deref().map(split_num_set),
            hours: self.hour.as_deref().map(split_num_set),
            query: self.q.clone(),
        }
    }
}

/// Split a comma-separated parameter into a set. The empty string yields the
/// empty set, which the filter treats as "nothing passes".
fn split_set(value: &str) -> HashSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a comma-separated numeric parameter into a set. Tokens that do not
/// parse as numbers are skipped.
fn split_num_set(value: &str) -> HashSet<u32> {
    value
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}

/// Request body for `POST /todos`.
#[derive(Debug, Deserialize)]
pub struct TodoCreateRequest {
    /// Free-text description of the task.
    pub task: String,

    /// Priority label: "High", "Medium", or "Low".
    pub priority: TodoPriority,

    /// Initial status.
    pub status: TodoStatus,
}

/// Request body for `PUT /todos/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct TodoUpdateRequest {
    /// The new status.
    pub status: TodoStatus,
}
