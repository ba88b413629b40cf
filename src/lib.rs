//! Taskpulse - analytics and miss-risk prediction for facility maintenance task logs.
//!
//! # Overview
//!
//! Taskpulse loads a facility task log (CSV), derives calendar and status
//! fields once at load time, and serves filtered views, aggregate metrics,
//! and per-task miss-risk predictions over a small HTTP API. A lightweight
//! in-memory to-do list rides along for the operations team.
//!
//! The pipeline is strictly Loader -> Filter -> Aggregator: every request
//! recomputes its view from the immutable in-memory record set, so the same
//! record set and the same filter always produce the same numbers.
//!
//! # API Endpoints
//!
//! - `GET /summary` - Aggregate metrics for the (optionally filtered) log
//! - `GET /records` - Filtered task records as JSON
//! - `GET /export` - Filtered task records as a CSV download
//! - `POST /predict` - Score a hand-entered task against the trained classifier
//! - `GET /todos`, `POST /todos`, `PUT /todos/{id}/status` - To-do list
//! - `GET /health` - Health check
//!
//! # Modules
//!
//! - [`model`]: Task records and the wire types for filters and summaries
//! - [`error`]: The typed error taxonomy shared by loader and classifier
//! - [`loader`]: CSV loading, field derivation, and CSV export
//! - [`filter`]: Composable conjunctive filtering of record sets
//! - [`aggregation`]: Summary statistics, trends, and the miss heatmap
//! - [`classifier`]: Feature encoding and the external-model adapter
//! - [`todo`]: In-memory to-do store
//! - [`api`]: HTTP API handlers

pub mod aggregation;
pub mod api;
pub mod classifier;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod todo;
