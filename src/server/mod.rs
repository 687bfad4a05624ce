//! Axum-based HTTP server for the nutralingo backend.
//!
//! This module sets up the HTTP server, configures routes, and exposes the
//! analysis pipeline, cache maintenance and observability endpoints to the
//! web front end.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual API endpoints (analyze, meal, metrics...).
//! - `middleware`: Request ID tracking and per-request performance recording.
//! - `routes`: The main router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::MetricsSnapshot;
pub use routes::{create_router, AppState};
