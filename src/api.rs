//! HTTP API handlers for Taskpulse.
//!
//! Each handler is one explicit request/response computation over the
//! shared application state: filter the immutable record set, aggregate,
//! and return the numbers. Nothing here formats percentages or dates for
//! display; that is the presentation layer's job.
//!
//! Error mapping:
//!
//! - unknown categorical value at prediction time -> 422
//! - classifier artifact never loaded -> 503
//! - unknown to-do id -> 404
//! - malformed filter/body parameters -> 400 (axum rejections)

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::aggregation::{self, AggregateSummary};
use crate::classifier::{Recommendation, RiskClassifier};
use crate::error::TaskLogError;
use crate::filter;
use crate::loader;
use crate::model::{FilterQuery, TaskRecord, TodoCreateRequest, TodoUpdateRequest};
use crate::todo::{TodoItem, TodoStore};

/// File name suggested for CSV downloads.
const EXPORT_FILE_NAME: &str = "facility_tasks_export.csv";

/// Application state shared across handlers.
///
/// One instance per process: the record set is loaded once and never
/// mutated, the classifier load outcome (success or failure) is cached for
/// the process lifetime, and the to-do store belongs to the single active
/// session.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<Vec<TaskRecord>>,
    pub classifier: Arc<Result<RiskClassifier, TaskLogError>>,
    pub todos: Arc<Mutex<TodoStore>>,
}

impl AppState {
    pub fn new(
        records: Vec<TaskRecord>,
        classifier: Result<RiskClassifier, TaskLogError>,
    ) -> Self {
        Self {
            records: Arc::new(records),
            classifier: Arc::new(classifier),
            todos: Arc::new(Mutex::new(TodoStore::new())),
        }
    }
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /summary - Aggregate metrics for the filtered record set.
///
/// Accepts the filter parameters described on [`FilterQuery`]. An empty
/// result is a valid zero-valued summary, not an error.
#[instrument(skip(state))]
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Json<AggregateSummary> {
    let filtered = filter::apply(&state.records, &query.criteria());
    let summary = aggregation::summarize(&filtered);

    info!(
        total = summary.total_count,
        missed = summary.missed_count,
        "Summary computed"
    );

    Json(summary)
}

/// GET /records - The filtered record set, input order preserved.
#[instrument(skip(state))]
pub async fn get_records(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Json<Vec<TaskRecord>> {
    let filtered = filter::apply(&state.records, &query.criteria());

    info!(record_count = filtered.len(), "Records queried");

    Json(filtered)
}

/// GET /export - The filtered record set as a CSV download.
#[instrument(skip(state))]
pub async fn export_records(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let filtered = filter::apply(&state.records, &query.criteria());

    match loader::export(&filtered) {
        Ok(csv) => {
            info!(record_count = filtered.len(), "Records exported");
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
                    ),
                ],
                csv,
            ))
        }
        Err(e) => {
            warn!(error = %e, "Failed to export records");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// One recommendation in a prediction response.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationEntry {
    /// Machine-readable action.
    pub action: Recommendation,

    /// Human-readable description.
    pub message: &'static str,
}

/// Feature importance entry in a prediction response.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub weight: f64,
}

/// Response body for `POST /predict`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    /// Whether the model expects the task to be missed.
    pub likely_missed: bool,

    /// Probability of a miss, in [0, 1].
    pub confidence: f64,

    /// Applicable follow-up actions; empty unless `likely_missed`.
    pub recommendations: Vec<RecommendationEntry>,

    /// Per-feature absolute weight magnitudes, most important first.
    pub feature_importance: Vec<FeatureWeight>,
}

/// POST /predict - Score a hand-entered task against the trained classifier.
///
/// Returns 503 when the classifier artifact failed to load at startup (the
/// failure is cached; the adapter never guesses a prediction) and 422 when
/// a categorical value is outside the trained vocabulary.
#[instrument(skip(state, input))]
pub async fn post_predict(
    State(state): State<AppState>,
    Json(input): Json<crate::classifier::PredictionInput>,
) -> Result<Json<PredictionResponse>, (StatusCode, String)> {
    let classifier = match state.classifier.as_ref() {
        Ok(classifier) => classifier,
        Err(e) => {
            warn!(error = %e, "Prediction requested but no model is loaded");
            return Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string()));
        }
    };

    match classifier.predict(&input) {
        Ok(prediction) => {
            info!(
                likely_missed = prediction.likely_missed,
                confidence = prediction.confidence,
                "Task scored"
            );

            let recommendations = prediction
                .recommendations
                .iter()
                .map(|&action| RecommendationEntry {
                    action,
                    message: action.label(),
                })
                .collect();
            let feature_importance = classifier
                .feature_importance()
                .iter()
                .map(|(feature, weight)| FeatureWeight {
                    feature: feature.clone(),
                    weight: *weight,
                })
                .collect();

            Ok(Json(PredictionResponse {
                likely_missed: prediction.likely_missed,
                confidence: prediction.confidence,
                recommendations,
                feature_importance,
            }))
        }
        Err(e @ TaskLogError::UnknownCategory { .. }) => {
            warn!(error = %e, "Prediction input outside the trained vocabulary");
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
        Err(e) => {
            warn!(error = %e, "Prediction failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// To-do item as the table view wants it: one flag per status column.
///
/// Exactly one of the three flags is true; the store's status enum makes
/// any other combination unrepresentable.
#[derive(Debug, Clone, Serialize)]
pub struct TodoView {
    pub id: u64,
    pub task: String,
    pub priority: crate::todo::TodoPriority,
    pub completed: bool,
    pub delayed: bool,
    pub missed: bool,
}

impl From<&TodoItem> for TodoView {
    fn from(item: &TodoItem) -> Self {
        Self {
            id: item.id,
            task: item.task.clone(),
            priority: item.priority,
            completed: item.status.is_completed(),
            delayed: item.status.is_delayed(),
            missed: item.status.is_missed(),
        }
    }
}

/// GET /todos - All to-do items in display order.
#[instrument(skip(state))]
pub async fn list_todos(
    State(state): State<AppState>,
) -> Result<Json<Vec<TodoView>>, StatusCode> {
    let todos = state.todos.lock().map_err(|_| {
        warn!("To-do store lock poisoned");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(todos.items().iter().map(TodoView::from).collect()))
}

/// POST /todos - Add a to-do item.
#[instrument(skip(state, request))]
pub async fn create_todo(
    State(state): State<AppState>,
    Json(request): Json<TodoCreateRequest>,
) -> Result<(StatusCode, Json<TodoView>), StatusCode> {
    let mut todos = state.todos.lock().map_err(|_| {
        warn!("To-do store lock poisoned");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let id = todos.add(&request.task, request.priority, request.status);
    info!(id, "To-do item added");

    // Just inserted under the same lock
    let view = todos
        .get(id)
        .map(TodoView::from)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /todos/{id}/status - Replace an item's status.
///
/// The update is a single assignment under the store lock; no caller can
/// observe an item between statuses.
#[instrument(skip(state, request))]
pub async fn update_todo_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<TodoUpdateRequest>,
) -> Result<Json<TodoView>, (StatusCode, String)> {
    let mut todos = state.todos.lock().map_err(|_| {
        warn!("To-do store lock poisoned");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "to-do store unavailable".to_string(),
        )
    })?;

    match todos.update_status(id, request.status) {
        Ok(()) => {
            info!(id, status = ?request.status, "To-do status updated");
            let view = todos
                .get(id)
                .map(TodoView::from)
                .ok_or_else(|| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "item vanished during update".to_string(),
                    )
                })?;
            Ok(Json(view))
        }
        Err(e @ TaskLogError::UnknownTodo(_)) => {
            warn!(id, "To-do status update for unknown item");
            Err((StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e) => {
            warn!(id, error = %e, "To-do status update failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
