// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDateTime};
use common::DashboardStats;
use tracing::{debug, info};

use crate::error::PlannerError;
use crate::planner::{Action, EmployeeEntry, EmployeeSchedule, JobDetails, Notice, Planner};
use crate::renderer::{NowIndicator, ScheduleView};

pub type AppState = Arc<Planner>;

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Handler rendering the schedule for the current view.
pub async fn get_schedule(State(planner): State<AppState>) -> Json<ScheduleView> {
    Json(planner.render(now()))
}

/// Handler applying one user action, answering with the re-rendered schedule.
pub async fn dispatch_action(
    State(planner): State<AppState>,
    Json(action): Json<Action>,
) -> Result<Json<ScheduleView>, AppError> {
    let now = now();
    planner.dispatch(action, now).await?;
    Ok(Json(planner.render(now)))
}

/// Handler draining pending notices.
pub async fn take_notices(State(planner): State<AppState>) -> Json<Vec<Notice>> {
    Json(planner.take_notices())
}

/// Handler for the minute tick of the current-time indicator.
pub async fn get_now_indicator(State(planner): State<AppState>) -> Json<Option<NowIndicator>> {
    Json(planner.tick(now()))
}

pub async fn get_dashboard(State(planner): State<AppState>) -> Json<DashboardStats> {
    Json(planner.dashboard(now().date()).await)
}

/// Handler for the detail popup of one job.
pub async fn get_job_details(
    State(planner): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobDetails>, AppError> {
    debug!("Looking up details of job {}", job_id);
    let details = planner
        .job_details(&job_id)
        .ok_or_else(|| PlannerError::NotFound(format!("job {job_id}")))?;
    Ok(Json(details))
}

pub async fn list_employees(State(planner): State<AppState>) -> Json<Vec<EmployeeEntry>> {
    Json(planner.employees())
}

/// Handler for the field view of one employee.
pub async fn get_employee_schedule(
    State(planner): State<AppState>,
    Path(employee_id): Path<String>,
) -> Json<EmployeeSchedule> {
    let schedule = planner.employee_schedule(&employee_id, now()).await;
    info!(
        "Employee {} has {} planned jobs",
        employee_id,
        schedule.jobs.len()
    );
    Json(schedule)
}

// --- Custom Error Handling ---

/// Our custom error type for the application.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
}

impl AppError {
    fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }
}

impl From<PlannerError> for AppError {
    fn from(err: PlannerError) -> Self {
        let code = match &err {
            PlannerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PlannerError::NotFound(_) => StatusCode::NOT_FOUND,
            PlannerError::MutationRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PlannerError::RemoteUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(code, &err.to_string())
    }
}

/// Allows converting an `anyhow::Error` into our `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Log the internal error for debugging.
        tracing::error!("Internal server error: {:?}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred.",
        )
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
