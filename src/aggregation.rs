//! Aggregation logic for the dashboard metrics.
//!
//! [`summarize`] computes every number the dashboard and visualization
//! pages show from one pass over a record set plus a handful of groupings.
//! It is a pure function and degrades gracefully: an empty record set
//! yields zeros, empty series, and explicit "not available" sentinels,
//! never a division error or a guessed value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::model::TaskRecord;

/// How many records the recent-activity feed shows.
const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Everything the presentation layer needs for one view of the log.
///
/// Rates are unrounded; formatting for display is the presentation
/// layer's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// Number of records in the view.
    pub total_count: usize,

    /// Number of missed records in the view.
    pub missed_count: usize,

    /// 100 * missed / total, or 0 when the view is empty.
    pub risk_score: f64,

    /// Record count per raw status string.
    pub status_counts: HashMap<String, usize>,

    /// Completed/missed counts per calendar date, sorted by date.
    ///
    /// Sparse: dates with no records are omitted, not zero-filled.
    pub daily_trend: Vec<DailyCount>,

    /// Completion stats for Monday-Friday records.
    pub weekday: PartitionStats,

    /// Completion stats for Saturday-Sunday records.
    pub weekend: PartitionStats,

    /// Dense day-of-month x hour-of-day grid of missed-task counts.
    pub heatmap: MissHeatmap,

    /// Modal hour-of-day among missed records; `None` when the view has no
    /// missed records (reported as not available, never defaulted to 0).
    pub peak_missed_hour: Option<u32>,

    /// Task type with the highest miss rate; `None` when no record carries
    /// a task type. Ties break to the lexicographically smallest type.
    pub highest_risk_task_type: Option<String>,

    /// Snapshot of the most recent calendar date in the view, if any.
    pub today: Option<TodaySnapshot>,

    /// The most recent records by timestamp, newest first.
    pub recent_activity: Vec<TaskRecord>,
}

/// Completed and missed counts for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub completed: usize,
    pub missed: usize,
}

/// Completion stats for one weekend/weekday partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionStats {
    /// Records in the partition.
    pub total: usize,

    /// Records in the partition with status "Completed".
    pub completed: usize,

    /// 100 * completed / total, or 0 when the partition is empty.
    pub completion_rate: f64,
}

impl PartitionStats {
    fn from_counts(total: usize, completed: usize) -> Self {
        let completion_rate = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total,
            completed,
            completion_rate,
        }
    }
}

/// Dense grid of missed-task counts.
///
/// Axes cover the days of month and hours of day observed among missed
/// records, in ascending order; cells with no misses are zero-filled,
/// unlike the sparse daily trend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissHeatmap {
    /// Row axis: observed days of month, ascending.
    pub days: Vec<u32>,

    /// Column axis: observed hours of day, ascending.
    pub hours: Vec<u32>,

    /// `counts[row][col]` = missed tasks on `days[row]` at `hours[col]`.
    pub counts: Vec<Vec<usize>>,
}

/// Counts for the latest calendar date present in the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodaySnapshot {
    /// The latest date in the view.
    pub date: NaiveDate,

    /// Completed tasks on that date.
    pub completed: usize,

    /// Missed tasks on that date.
    pub missed: usize,

    /// 100 * completed / (completed + missed), or 0 when both are zero.
    pub completion_rate: f64,
}

/// Compute the full aggregate summary for a record set.
pub fn summarize(records: &[TaskRecord]) -> AggregateSummary {
    let total_count = records.len();
    let missed_count = records.iter().filter(|r| r.is_missed).count();

    let risk_score = if total_count > 0 {
        missed_count as f64 / total_count as f64 * 100.0
    } else {
        0.0
    };

    let mut status_counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        *status_counts.entry(record.status.clone()).or_insert(0) += 1;
    }

    AggregateSummary {
        total_count,
        missed_count,
        risk_score,
        status_counts,
        daily_trend: daily_trend(records),
        weekday: partition_stats(records, false),
        weekend: partition_stats(records, true),
        heatmap: miss_heatmap(records),
        peak_missed_hour: peak_missed_hour(records),
        highest_risk_task_type: highest_risk_task_type(records),
        today: today_snapshot(records),
        recent_activity: recent_activity(records),
    }
}

/// Group by calendar date, counting completed and missed records.
fn daily_trend(records: &[TaskRecord]) -> Vec<DailyCount> {
    let mut by_date: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();

    for record in records {
        let entry = by_date.entry(record.date).or_insert((0, 0));
        if record.is_completed() {
            entry.0 += 1;
        }
        if record.is_missed {
            entry.1 += 1;
        }
    }

    by_date
        .into_iter()
        .map(|(date, (completed, missed))| DailyCount {
            date,
            completed,
            missed,
        })
        .collect()
}

fn partition_stats(records: &[TaskRecord], weekend: bool) -> PartitionStats {
    let partition = records.iter().filter(|r| r.is_weekend == weekend);

    let mut total = 0;
    let mut completed = 0;
    for record in partition {
        total += 1;
        if record.is_completed() {
            completed += 1;
        }
    }

    PartitionStats::from_counts(total, completed)
}

/// Build the dense missed-task grid over the observed day/hour axes.
fn miss_heatmap(records: &[TaskRecord]) -> MissHeatmap {
    let mut cells: BTreeMap<(u32, u32), usize> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_missed) {
        *cells
            .entry((record.day_of_month, record.hour_of_day))
            .or_insert(0) += 1;
    }

    if cells.is_empty() {
        return MissHeatmap::default();
    }

    // Map keys are ordered by day first, so days come out sorted already.
    let mut days: Vec<u32> = cells.keys().map(|&(day, _)| day).collect();
    days.dedup();
    let mut hours: Vec<u32> = cells.keys().map(|&(_, hour)| hour).collect();
    hours.sort_unstable();
    hours.dedup();

    let counts = days
        .iter()
        .map(|&day| {
            hours
                .iter()
                .map(|&hour| cells.get(&(day, hour)).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    MissHeatmap {
        days,
        hours,
        counts,
    }
}

/// Modal hour among missed records; ties break to the smallest hour.
fn peak_missed_hour(records: &[TaskRecord]) -> Option<u32> {
    let mut by_hour: BTreeMap<u32, usize> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_missed) {
        *by_hour.entry(record.hour_of_day).or_insert(0) += 1;
    }

    by_hour
        .into_iter()
        .max_by_key(|&(hour, count)| (count, std::cmp::Reverse(hour)))
        .map(|(hour, _)| hour)
}

/// Task type with the highest miss rate among records that carry a type.
///
/// Iteration is over a sorted map and only a strictly greater rate replaces
/// the current best, so ties resolve to the lexicographically smallest type.
fn highest_risk_task_type(records: &[TaskRecord]) -> Option<String> {
    let mut by_type: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in records {
        if let Some(task_type) = record.task_type.as_deref() {
            let entry = by_type.entry(task_type).or_insert((0, 0));
            entry.0 += 1;
            if record.is_missed {
                entry.1 += 1;
            }
        }
    }

    let mut best: Option<(&str, f64)> = None;
    for (task_type, (total, missed)) in by_type {
        let rate = missed as f64 / total as f64;
        if best.is_none_or(|(_, best_rate)| rate > best_rate) {
            best = Some((task_type, rate));
        }
    }

    best.map(|(task_type, _)| task_type.to_string())
}

fn today_snapshot(records: &[TaskRecord]) -> Option<TodaySnapshot> {
    let latest = records.iter().map(|r| r.date).max()?;

    let mut completed = 0;
    let mut missed = 0;
    for record in records.iter().filter(|r| r.date == latest) {
        if record.is_completed() {
            completed += 1;
        }
        if record.is_missed {
            missed += 1;
        }
    }

    let decided = completed + missed;
    let completion_rate = if decided > 0 {
        completed as f64 / decided as f64 * 100.0
    } else {
        0.0
    };

    Some(TodaySnapshot {
        date: latest,
        completed,
        missed,
        completion_rate,
    })
}

fn recent_activity(records: &[TaskRecord]) -> Vec<TaskRecord> {
    let mut recent: Vec<TaskRecord> = records.to_vec();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent.truncate(RECENT_ACTIVITY_LIMIT);
    recent
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

    #[test]
    fn test_empty_record_set_degrades_to_zero() {
        let summary = summarize(&[]);

        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.missed_count, 0);
        assert_eq!(summary.risk_score, 0.0);
        assert!(summary.daily_trend.is_empty());
        assert_eq!(summary.weekday, PartitionStats::default());
        assert_eq!(summary.weekend, PartitionStats::default());
        assert_eq!(summary.heatmap, MissHeatmap::default());
        assert_eq!(summary.peak_missed_hour, None);
        assert_eq!(summary.highest_risk_task_type, None);
        assert!(summary.today.is_none());
        assert!(summary.recent_activity.is_empty());
    }

    #[test]
    fn test_weekend_weekday_scenario() {
        // Mon completed, Sat missed, Sun completed
        let records = vec![
            record("Completed", "2024-01-01 08:00:00"),
            record("Missed", "2024-01-06 14:00:00"),
            record("Completed", "2024-01-07 09:00:00"),
        ];

        let summary = summarize(&records);

        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.missed_count, 1);
        assert!((summary.risk_score - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.weekend.total, 2);
        assert_eq!(summary.weekend.completion_rate, 50.0);
        assert_eq!(summary.weekday.total, 1);
        assert_eq!(summary.weekday.completion_rate, 100.0);
    }

    #[test]
    fn test_risk_score_bounds() {
        let all_missed = vec![
            record("Missed", "2024-01-01 08:00:00"),
            record("missed", "2024-01-02 08:00:00"),
        ];
        assert_eq!(summarize(&all_missed).risk_score, 100.0);

        let none_missed = vec![record("Completed", "2024-01-01 08:00:00")];
        assert_eq!(summarize(&none_missed).risk_score, 0.0);
    }

    #[test]
    fn test_daily_trend_is_sparse_and_sorted() {
        let records = vec![
            record("Completed", "2024-01-05 08:00:00"),
            record("Missed", "2024-01-01 09:00:00"),
            record("Completed", "2024-01-01 10:00:00"),
        ];

        let summary = summarize(&records);

        // Jan 2-4 have no records and are omitted
        assert_eq!(summary.daily_trend.len(), 2);
        assert_eq!(
            summary.daily_trend[0],
            DailyCount {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                completed: 1,
                missed: 1,
            }
        );
        assert_eq!(
            summary.daily_trend[1].date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
    }

    #[test]
    fn test_heatmap_is_dense_over_observed_axes() {
        let records = vec![
            record("Missed", "2024-01-01 08:00:00"),
            record("Missed", "2024-01-03 10:00:00"),
            record("Missed", "2024-01-03 10:30:00"),
            // Completed records never show up in the miss heatmap
            record("Completed", "2024-01-02 12:00:00"),
        ];

        let heatmap = summarize(&records).heatmap;

        assert_eq!(heatmap.days, vec![1, 3]);
        assert_eq!(heatmap.hours, vec![8, 10]);
        // Unobserved combinations are zero-filled
        assert_eq!(heatmap.counts, vec![vec![1, 0], vec![0, 2]]);
    }

    #[test]
    fn test_peak_missed_hour_mode_and_tie() {
        let records = vec![
            record("Missed", "2024-01-01 14:00:00"),
            record("Missed", "2024-01-02 14:30:00"),
            record("Missed", "2024-01-03 09:00:00"),
        ];
        assert_eq!(summarize(&records).peak_missed_hour, Some(14));

        // Equal counts: smallest hour wins
        let tied = vec![
            record("Missed", "2024-01-01 16:00:00"),
            record("Missed", "2024-01-02 09:00:00"),
        ];
        assert_eq!(summarize(&tied).peak_missed_hour, Some(9));

        // No missed records: not available, never hour 0
        let none = vec![record("Completed", "2024-01-01 00:00:00")];
        assert_eq!(summarize(&none).peak_missed_hour, None);
    }

    #[test]
    fn test_highest_risk_task_type() {
        let records = vec![
            record("Missed", "2024-01-01 08:00:00").with_task_type("Repair"),
            record("Completed", "2024-01-02 08:00:00").with_task_type("Repair"),
            record("Missed", "2024-01-03 08:00:00").with_task_type("Cleaning"),
        ];

        // Cleaning misses 1/1, Repair 1/2
        assert_eq!(
            summarize(&records).highest_risk_task_type.as_deref(),
            Some("Cleaning")
        );
    }

    #[test]
    fn test_highest_risk_task_type_tie_breaks_lexicographically() {
        let records = vec![
            record("Missed", "2024-01-01 08:00:00").with_task_type("Repair"),
            record("Missed", "2024-01-02 08:00:00").with_task_type("Cleaning"),
        ];

        assert_eq!(
            summarize(&records).highest_risk_task_type.as_deref(),
            Some("Cleaning")
        );
    }

    #[test]
    fn test_highest_risk_task_type_without_type_data() {
        let records = vec![record("Missed", "2024-01-01 08:00:00")];

        assert_eq!(summarize(&records).highest_risk_task_type, None);
    }

    #[test]
    fn test_today_snapshot_uses_latest_date() {
        let records = vec![
            record("Completed", "2024-01-01 08:00:00"),
            record("Completed", "2024-01-09 08:00:00"),
            record("Missed", "2024-01-09 10:00:00"),
            record("Scheduled", "2024-01-09 18:00:00"),
        ];

        let today = summarize(&records).today.unwrap();

        assert_eq!(today.date, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(today.completed, 1);
        assert_eq!(today.missed, 1);
        assert_eq!(today.completion_rate, 50.0);
    }

    #[test]
    fn test_recent_activity_newest_first_capped() {
        let records: Vec<TaskRecord> = (1..=8)
            .map(|day| record("Completed", &format!("2024-01-{day:02} 08:00:00")))
            .collect();

        let recent = summarize(&records).recent_activity;

        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].day_of_month, 8);
        assert_eq!(recent[4].day_of_month, 4);
    }

    #[test]
    fn test_status_counts() {
        let records = vec![
            record("Completed", "2024-01-01 08:00:00"),
            record("Completed", "2024-01-02 08:00:00"),
            record("In Progress", "2024-01-03 08:00:00"),
        ];

        let counts = summarize(&records).status_counts;
        assert_eq!(counts.get("Completed"), Some(&2));
        assert_eq!(counts.get("In Progress"), Some(&1));
    }
}
