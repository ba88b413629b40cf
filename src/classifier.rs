//! Risk classifier adapter: feature encoding and external-model scoring.
//!
//! The model itself is trained elsewhere; this module owns the contract
//! with it. Categorical fields go through fixed vocabularies agreed at
//! training time, the feature vector follows the training-time column
//! order exactly, and a value the model has never seen is an explicit
//! [`TaskLogError::UnknownCategory`], never a silently substituted default.

use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::TaskLogError;

/// Task type vocabulary, in the encoder's fitted (sorted) order.
pub const TASK_TYPE_CLASSES: [&str; 5] =
    ["Cleaning", "Inspection", "Maintenance", "Other", "Repair"];

/// Priority vocabulary, in the encoder's fitted (sorted) order.
pub const PRIORITY_CLASSES: [&str; 3] = ["High", "Low", "Medium"];

/// Time slot vocabulary, in the encoder's fitted (sorted) order.
pub const TIME_SLOT_CLASSES: [&str; 4] = ["Afternoon", "Evening", "Morning", "Night"];

/// Feature vector layout the model was trained on. Order is part of the
/// contract; never reorder.
pub const FEATURE_NAMES: [&str; 22] = [
    "Facility_ID",
    "Task_Type",
    "Priority",
    "Delay_Duration",
    "Actual_Duration",
    "Workload_Estimate",
    "Day_of_Week",
    "Time_Slot",
    "Task_Frequency",
    "Hour_of_Day",
    "Week_of_Year",
    "Day_of_Month",
    "Weekend",
    "Previous_Task_Delay",
    "Rolling_Avg_Delay",
    "Scheduled_Year",
    "Scheduled_Month",
    "Scheduled_Day",
    "Scheduled_Weekday",
    "Actual_Start_Hour",
    "Actual_Completion_Hour",
    "Start_Duration",
];

/// Start delay above which a schedule review is recommended (minutes).
const START_DELAY_REVIEW_MINUTES: f64 = 60.0;

/// Actual duration above which task splitting is recommended (minutes).
const LONG_TASK_MINUTES: f64 = 240.0;

/// A single hypothetical task to score, as entered on the prediction page.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionInput {
    /// Facility the task belongs to.
    pub facility_id: u32,

    /// Task category; must be in [`TASK_TYPE_CLASSES`].
    pub task_type: String,

    /// Priority label; must be in [`PRIORITY_CLASSES`].
    pub priority: String,

    /// Coarse bucket of day; must be in [`TIME_SLOT_CLASSES`].
    pub time_slot: String,

    /// Estimated workload in hours.
    #[serde(default)]
    pub workload_estimate: f64,

    /// How many times per week the task recurs.
    #[serde(default)]
    pub task_frequency: u32,

    /// Known delay for this task in minutes.
    #[serde(default)]
    pub delay_duration: f64,

    /// Delay of the previous task in minutes.
    #[serde(default)]
    pub previous_task_delay: f64,

    /// Rolling average delay in minutes.
    #[serde(default)]
    pub rolling_avg_delay: f64,

    /// Scheduled calendar date.
    pub scheduled_date: NaiveDate,

    /// Scheduled time of day.
    pub scheduled_time: NaiveTime,

    /// When work actually started, if known.
    #[serde(default)]
    pub actual_start_time: Option<NaiveTime>,

    /// When work actually finished, if known.
    #[serde(default)]
    pub actual_completion_time: Option<NaiveTime>,
}

impl PredictionInput {
    /// Minutes between scheduled and actual start. Negative when work
    /// started early; 0 when the actual start is unknown.
    pub fn start_delay_minutes(&self) -> f64 {
        match self.actual_start_time {
            Some(start) => (start - self.scheduled_time).num_seconds() as f64 / 60.0,
            None => 0.0,
        }
    }

    /// Minutes between actual start and completion; 0 when either endpoint
    /// is unknown.
    pub fn actual_duration_minutes(&self) -> f64 {
        match (self.actual_start_time, self.actual_completion_time) {
            (Some(start), Some(end)) => (end - start).num_seconds() as f64 / 60.0,
            _ => 0.0,
        }
    }

    /// Encode the input into the model's feature vector.
    ///
    /// The returned vector matches [`FEATURE_NAMES`] position for position.
    pub fn features(&self) -> Result<Vec<f64>, TaskLogError> {
        let task_type = encode(&TASK_TYPE_CLASSES, "task type", &self.task_type)?;
        let priority = encode(&PRIORITY_CLASSES, "priority", &self.priority)?;
        let time_slot = encode(&TIME_SLOT_CLASSES, "time slot", &self.time_slot)?;

        let weekday = self.scheduled_date.weekday().num_days_from_monday();
        let weekend = if weekday >= 5 { 1.0 } else { 0.0 };

        Ok(vec![
            f64::from(self.facility_id),
            task_type,
            priority,
            self.delay_duration,
            self.actual_duration_minutes(),
            self.workload_estimate,
            f64::from(weekday),
            time_slot,
            f64::from(self.task_frequency),
            f64::from(self.scheduled_time.hour()),
            f64::from(self.scheduled_date.iso_week().week()),
            f64::from(self.scheduled_date.day()),
            weekend,
            self.previous_task_delay,
            self.rolling_avg_delay,
            f64::from(self.scheduled_date.year()),
            f64::from(self.scheduled_date.month()),
            f64::from(self.scheduled_date.day()),
            f64::from(weekday),
            f64::from(self.actual_start_time.map_or(0, |t| t.hour())),
            f64::from(self.actual_completion_time.map_or(0, |t| t.hour())),
            self.start_delay_minutes(),
        ])
    }
}

/// Map a categorical value to its vocabulary index.
fn encode(vocab: &[&str], field: &'static str, value: &str) -> Result<f64, TaskLogError> {
    vocab
        .iter()
        .position(|v| *v == value)
        .map(|i| i as f64)
        .ok_or_else(|| TaskLogError::UnknownCategory {
            field,
            value: value.to_string(),
        })
}

/// An opaque scoring capability: the externally trained classifier.
pub trait TaskScorer: Send + Sync {
    /// Score an encoded feature vector.
    ///
    /// Returns the predicted label (true = likely missed) and the
    /// probability of a miss in [0, 1].
    fn score(&self, features: &[f64]) -> (bool, f64);
}

/// Serialized form of the trained classifier.
///
/// Produced by the training pipeline; the vocabularies it carries must
/// match the compiled-in ones exactly or the load is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub task_type_classes: Vec<String>,
    pub priority_classes: Vec<String>,
    pub time_slot_classes: Vec<String>,
}

/// Logistic scorer over the fixed feature vector.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }
}

impl TaskScorer for LogisticModel {
    fn score(&self, features: &[f64]) -> (bool, f64) {
        let z: f64 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        let probability = 1.0 / (1.0 + (-z).exp());

        (probability >= 0.5, probability)
    }
}

/// Deterministic, rule-based follow-up actions for a task predicted to be
/// missed. Independent checks; every applicable one is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Start delay exceeded an hour.
    ScheduleReview,
    /// The task ran longer than four hours.
    TaskSplitting,
    /// High-priority task at risk.
    ResourceReallocation,
}

impl Recommendation {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::ScheduleReview => {
                "Review scheduling process to reduce start time delays"
            }
            Recommendation::TaskSplitting => {
                "Consider breaking down the task into smaller subtasks"
            }
            Recommendation::ResourceReallocation => "Allocate additional resources or personnel",
        }
    }
}

/// Outcome of scoring one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Whether the model expects the task to be missed.
    pub likely_missed: bool,

    /// Probability of a miss, in [0, 1]. Unrounded; formatting is the
    /// presentation layer's job.
    pub confidence: f64,

    /// Applicable follow-up actions; empty unless `likely_missed`.
    pub recommendations: Vec<Recommendation>,
}

/// Adapter that owns the loaded scorer and the encoding contract.
pub struct RiskClassifier {
    scorer: Box<dyn TaskScorer>,
    importance: Vec<(String, f64)>,
}

impl std::fmt::Debug for RiskClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskClassifier")
            .field("importance", &self.importance)
            .finish_non_exhaustive()
    }
}

impl RiskClassifier {
    /// Load the classifier artifact from disk.
    ///
    /// Any failure (missing file, corrupt JSON, vocabulary or shape
    /// mismatch) is a [`TaskLogError::ModelUnavailable`]; the caller caches
    /// that outcome for the process lifetime rather than retrying.
    pub fn load(path: &Path) -> Result<Self, TaskLogError> {
        let bytes = fs::read(path).map_err(|e| {
            TaskLogError::ModelUnavailable(format!("{}: {e}", path.display()))
        })?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| TaskLogError::ModelUnavailable(format!("corrupt artifact: {e}")))?;

        Self::from_artifact(artifact)
    }

    /// Build the adapter from a parsed artifact, validating the contract.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, TaskLogError> {
        if artifact.feature_names != FEATURE_NAMES {
            return Err(TaskLogError::ModelUnavailable(
                "artifact feature names do not match the expected layout".to_string(),
            ));
        }
        if artifact.weights.len() != FEATURE_NAMES.len() {
            return Err(TaskLogError::ModelUnavailable(format!(
                "expected {} weights, artifact has {}",
                FEATURE_NAMES.len(),
                artifact.weights.len()
            )));
        }
        if artifact.task_type_classes != TASK_TYPE_CLASSES
            || artifact.priority_classes != PRIORITY_CLASSES
            || artifact.time_slot_classes != TIME_SLOT_CLASSES
        {
            return Err(TaskLogError::ModelUnavailable(
                "artifact vocabularies do not match the encoding contract".to_string(),
            ));
        }

        let mut importance: Vec<(String, f64)> = artifact
            .feature_names
            .iter()
            .zip(&artifact.weights)
            .map(|(name, weight)| (name.clone(), weight.abs()))
            .collect();
        importance.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(Self {
            scorer: Box::new(LogisticModel::new(artifact.weights, artifact.intercept)),
            importance,
        })
    }

    /// Wrap an arbitrary scorer (no importance information available).
    pub fn from_scorer(scorer: Box<dyn TaskScorer>) -> Self {
        Self {
            scorer,
            importance: Vec::new(),
        }
    }

    /// Encode the input and score it against the model.
    pub fn predict(&self, input: &PredictionInput) -> Result<Prediction, TaskLogError> {
        let features = input.features()?;
        let (likely_missed, confidence) = self.scorer.score(&features);

        Ok(Prediction {
            likely_missed,
            confidence,
            recommendations: recommendations(input, likely_missed),
        })
    }

    /// Per-feature absolute weight magnitudes, most important first.
    pub fn feature_importance(&self) -> &[(String, f64)] {
        &self.importance
    }
}

fn recommendations(input: &PredictionInput, likely_missed: bool) -> Vec<Recommendation> {
    if !likely_missed {
        return Vec::new();
    }

    let mut out = Vec::new();
    if input.start_delay_minutes() > START_DELAY_REVIEW_MINUTES {
        out.push(Recommendation::ScheduleReview);
    }
    if input.actual_duration_minutes() > LONG_TASK_MINUTES {
        out.push(Recommendation::TaskSplitting);
    }
    if input.priority == "High" {
        out.push(Recommendation::ResourceReallocation);
    }
    out
}
