// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use crate::handlers;
use crate::planner::Planner;
use axum::{
    Router,
    http::HeaderName,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Creates and configures the application router.
pub fn create_router(planner: Arc<Planner>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ])
        .allow_origin(Any);

    Router::new()
        .route("/api/schedule", get(handlers::get_schedule))
        .route("/api/actions", post(handlers::dispatch_action))
        .route("/api/notices", get(handlers::take_notices))
        .route("/api/now", get(handlers::get_now_indicator))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/jobs/{id}", get(handlers::get_job_details))
        .route("/api/employees", get(handlers::list_employees))
        .route(
            "/api/employees/{id}/schedule",
            get(handlers::get_employee_schedule),
        )
        .with_state(planner)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
