//! Taskpulse - analytics and miss-risk prediction for facility maintenance task logs.
//!
//! # Overview
//!
//! Loads the facility task log once at startup, acquires the trained
//! classifier artifact once (a failed load is cached, never retried), and
//! serves filtered views, aggregate metrics, predictions, and the to-do
//! list over HTTP.
//!
//! # Configuration
//!
//! - `TASKPULSE_PORT` - listen port (default 3000)
//! - `TASKPULSE_DATA_PATH` - task log CSV (default `facility_tasks.csv`)
//! - `TASKPULSE_MODEL_PATH` - classifier artifact (default `models/risk_model.json`)

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    Router,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use taskpulse::api::{
    AppState, create_todo, export_records, get_records, get_summary, health_check, list_todos,
    post_predict, update_todo_status,
};
use taskpulse::classifier::RiskClassifier;
use taskpulse::loader;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

/// Default task log path if not specified via environment variable.
const DEFAULT_DATA_PATH: &str = "facility_tasks.csv";

/// Default classifier artifact path if not specified via environment variable.
const DEFAULT_MODEL_PATH: &str = "models/risk_model.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("taskpulse=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("TASKPULSE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let data_path =
        PathBuf::from(env::var("TASKPULSE_DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.into()));
    let model_path = PathBuf::from(
        env::var("TASKPULSE_MODEL_PATH").unwrap_or_else(|_| DEFAULT_MODEL_PATH.into()),
    );

    info!(port, data_path = %data_path.display(), "Starting Taskpulse server");

    // Load the task log. All-or-nothing: a bad log is a startup failure.
    let records = loader::load(&data_path)?;

    // Acquire the classifier once. A failure is cached for the process
    // lifetime; /predict reports it as 503 instead of guessing.
    let classifier = RiskClassifier::load(&model_path);
    match &classifier {
        Ok(_) => info!(model_path = %model_path.display(), "Classifier model loaded"),
        Err(e) => warn!(error = %e, "Classifier unavailable; /predict will return 503"),
    }

    let state = AppState::new(records, classifier);

    // Build router
    let app = Router::new()
        .route("/summary", get(get_summary))
        .route("/records", get(get_records))
        .route("/export", get(export_records))
        .route("/predict", post(post_predict))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/:id/status", put(update_todo_status))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Taskpulse is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
