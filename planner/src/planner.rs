// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Application state of the planning page and the single dispatcher that
//! turns user actions into view changes or backend mutations.
//!
//! Mutations follow one cycle: intent, remote call, and on success a full
//! refetch that replaces the job store. On failure the store is left
//! exactly as it was. Deleting is the one exception: the job is removed
//! locally even when the backend refuses.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::{
    ASSIGNMENT_ROLE, CreateJobPayload, DashboardStats, EmployeeFilter, Granularity, Job,
    JobFilter, JobPatch, JobStatus, NewJob,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::colors::HslColor;
use crate::date_grid;
use crate::drag_drop::{DragDropCoordinator, DragState, DropTarget, MutationIntent, Region};
use crate::error::{PlannerError, Result};
use crate::job_store::JobStore;
use crate::remote::RemoteSync;
use crate::renderer::{self, NowIndicator, ScheduleView};
use crate::view_state::ViewState;

/// Everything the user can do on the planning page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Previous (`-1`) or next (`1`) range.
    Navigate { offset: i32 },
    Today,
    SwitchView { granularity: Granularity },
    SetFilter { filter: EmployeeFilter },
    /// Month grid click.
    SelectDay { date: NaiveDate },
    /// Year grid click, 1-based.
    SelectMonth { month: u32 },
    SearchPool { text: String },
    DragStart { job_id: String, source: Region },
    DragOver { target: Option<DropTarget> },
    DragCancel,
    Drop { target: Option<DropTarget> },
    Unassign { job_id: String },
    Delete { job_id: String },
    CreateJob(CreateJobPayload),
    Refresh,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient message for the user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JobDetails {
    pub id: String,
    pub title: String,
    pub customer: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobStatus,
    /// `29.12.2025, 13:00`, or `Nicht geplant`.
    pub time: String,
    pub assigned: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EmployeeEntry {
    pub id: String,
    pub name: String,
    pub color: HslColor,
}

/// The field view of one employee: planned jobs by start, and the next one due.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EmployeeSchedule {
    pub employee_id: String,
    pub jobs: Vec<Job>,
    pub next_job: Option<Job>,
}

#[derive(Debug, Clone)]
pub struct PlannerState {
    pub view: ViewState,
    pub store: JobStore,
    pub drag: DragDropCoordinator,
    pub pool_search: Option<String>,
    pub now_indicator: Option<NowIndicator>,
    notices: Vec<Notice>,
}

impl PlannerState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            view: ViewState::new(today),
            store: JobStore::default(),
            drag: DragDropCoordinator::new(),
            pool_search: None,
            now_indicator: None,
            notices: Vec::new(),
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }
}

/// The planning page: shared state plus the backend it syncs with.
///
/// State is held behind a lock that is never kept across an `.await`, so a
/// refetch finishing late simply overwrites the store (last write wins).
pub struct Planner {
    remote: Arc<dyn RemoteSync>,
    state: RwLock<PlannerState>,
}

impl Planner {
    pub fn new(remote: Arc<dyn RemoteSync>, today: NaiveDate) -> Self {
        Self {
            remote,
            state: RwLock::new(PlannerState::new(today)),
        }
    }

    /// A copy of the current state, mostly for inspection and tests.
    pub fn snapshot(&self) -> PlannerState {
        self.state.read().clone()
    }

    pub fn view(&self) -> ViewState {
        self.state.read().view.clone()
    }

    pub fn drag_state(&self) -> DragState {
        self.state.read().drag.state().clone()
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.state.write().notices)
    }

    /// Initial page load. Employees and jobs are fetched independently; a
    /// failing fetch leaves that part empty (or as cached) and never fails
    /// the page.
    pub async fn load(&self) {
        match self.remote.list_active_employees().await {
            Ok(employees) => {
                info!("Loaded {} active employees", employees.len());
                let mut state = self.state.write();
                let jobs = state.store.jobs().to_vec();
                state.store.replace_all(jobs, employees);
            }
            Err(e) => warn!("Failed to fetch employees: {}", e),
        }
        match self.remote.list_jobs(&JobFilter::all()).await {
            Ok(jobs) => {
                info!("Loaded {} jobs", jobs.len());
                self.state.write().store.replace_jobs(jobs);
            }
            Err(e) => warn!("Failed to fetch jobs: {}", e),
        }
    }

    /// Full resynchronisation with the backend.
    async fn resync(&self) -> Result<()> {
        let jobs = self.remote.list_jobs(&JobFilter::all()).await?;
        let employees = match self.remote.list_active_employees().await {
            Ok(employees) => Some(employees),
            Err(e) => {
                warn!("Keeping cached employees, refetch failed: {}", e);
                None
            }
        };

        let mut state = self.state.write();
        let employees = employees.unwrap_or_else(|| state.store.employees().to_vec());
        state.store.replace_all(jobs, employees);
        Ok(())
    }

    async fn resync_after_mutation(&self) {
        if let Err(e) = self.resync().await {
            warn!("Refetch after mutation failed, showing cached jobs: {}", e);
        }
    }

    /// Renders the current view. Re-rendering replaces the current-time
    /// indicator, so there is never more than one.
    pub fn render(&self, now: NaiveDateTime) -> ScheduleView {
        let mut state = self.state.write();
        let view = renderer::render(&state.view, &state.store, state.pool_search.as_deref(), now);
        state.now_indicator = view.model.now_indicator().cloned();
        view
    }

    /// Minute tick: recomputes the current-time indicator while a day or
    /// week view is active and clears it otherwise.
    pub fn tick(&self, now: NaiveDateTime) -> Option<NowIndicator> {
        let mut state = self.state.write();
        state.now_indicator = if state.view.granularity.is_timeline() {
            let range = date_grid::compute_visible_range(state.view.anchor, state.view.granularity);
            renderer::now_indicator(&range.dates(), now)
        } else {
            None
        };
        state.now_indicator.clone()
    }

    pub fn now_indicator(&self) -> Option<NowIndicator> {
        self.state.read().now_indicator.clone()
    }

    pub async fn dispatch(&self, action: Action, now: NaiveDateTime) -> Result<()> {
        debug!("Dispatching {:?}", action);
        match action {
            Action::Navigate { offset } => self.state.write().view.navigate(offset),
            Action::Today => self.state.write().view.go_to(now.date()),
            Action::SwitchView { granularity } => self.state.write().view.switch_view(granularity),
            Action::SetFilter { filter } => self.state.write().view.set_filter(filter),
            Action::SelectDay { date } => self.state.write().view.select_day(date),
            Action::SelectMonth { month } => self.state.write().view.select_month(month),
            Action::SearchPool { text } => {
                self.state.write().pool_search = Some(text).filter(|t| !t.trim().is_empty());
            }
            Action::DragStart { job_id, source } => {
                let mut state = self.state.write();
                let PlannerState { drag, store, .. } = &mut *state;
                drag.pick_up(&job_id, source, store)
                    .map_err(|e| PlannerError::InvalidInput(e.to_string()))?;
            }
            Action::DragOver { target } => self.state.write().drag.hover(target),
            Action::DragCancel => self.state.write().drag.cancel(),
            Action::Drop { target } => return self.drop_on(target).await,
            Action::Unassign { job_id } => return self.unassign(&job_id).await,
            Action::Delete { job_id } => return self.delete(&job_id).await,
            Action::CreateJob(payload) => return self.create_job(payload).await,
            Action::Refresh => {
                if let Err(e) = self.resync().await {
                    warn!("Refresh failed, keeping cached schedule: {}", e);
                }
            }
        }
        Ok(())
    }

    async fn drop_on(&self, target: Option<DropTarget>) -> Result<()> {
        let intent = {
            let mut state = self.state.write();
            let PlannerState {
                drag, view, store, ..
            } = &mut *state;
            drag.drop_on(target, &view.filter, store)
        };
        let Some(intent) = intent else {
            return Ok(());
        };

        // Also runs when this future is dropped before the backend answers.
        let _resolve = ResolveOnDrop(&self.state);
        self.apply(&intent).await
    }

    async fn apply(&self, intent: &MutationIntent) -> Result<()> {
        debug!("Applying drop of job {}", intent.job_id());
        match intent {
            MutationIntent::Unassign { job_id } => self.unassign(job_id).await,
            MutationIntent::Schedule {
                job_id,
                start,
                end,
                assignee,
            } => {
                let patch = JobPatch::schedule(*start, *end);
                if let Err(e) = self.remote.update_job(job_id, &patch).await {
                    return self.rejected("Fehler beim Planen", e);
                }
                // The job is planned even when binding the employee fails.
                if let Some(employee_id) = assignee {
                    if let Err(e) = self
                        .remote
                        .upsert_assignment(job_id, employee_id, ASSIGNMENT_ROLE)
                        .await
                    {
                        error!("Assigning job {} to {} failed: {}", job_id, employee_id, e);
                    }
                }
                self.resync_after_mutation().await;
                info!("Job {} planned at {}", job_id, start);
                self.state
                    .write()
                    .notify(NoticeLevel::Success, "Auftrag erfolgreich geplant");
                Ok(())
            }
        }
    }

    /// Back to the pool: open, no times, no assignments.
    async fn unassign(&self, job_id: &str) -> Result<()> {
        if self.state.read().store.find_by_id(job_id).is_none() {
            debug!("Unassign of unknown job {} ignored", job_id);
            return Ok(());
        }
        if let Err(e) = self.remote.update_job(job_id, &JobPatch::unschedule()).await {
            return self.rejected("Fehler beim Zurücksetzen", e);
        }
        if let Err(e) = self.remote.delete_assignments_for_job(job_id).await {
            error!("Removing assignments of job {} failed: {}", job_id, e);
        }
        self.resync_after_mutation().await;
        info!("Job {} moved back to the pool", job_id);
        self.state
            .write()
            .notify(NoticeLevel::Success, "Auftrag zurückgesetzt");
        Ok(())
    }

    /// Removes the job remotely and, whatever the backend says, locally.
    /// No refetch follows, so a stale read cannot bring the job back.
    async fn delete(&self, job_id: &str) -> Result<()> {
        if self.state.read().store.find_by_id(job_id).is_none() {
            debug!("Delete of unknown job {} ignored", job_id);
            return Ok(());
        }

        let remote_result = self.remote.delete_job(job_id).await;

        let mut state = self.state.write();
        match remote_result {
            Ok(()) | Err(PlannerError::NotFound(_)) => {}
            Err(e) => {
                warn!("Remote delete of job {} failed, removing locally: {}", job_id, e);
                state.notify(
                    NoticeLevel::Warning,
                    "Warnung: Datenbank nicht erreichbar, nur lokal gelöscht",
                );
            }
        }
        state.store.remove_local(job_id);
        state.notify(NoticeLevel::Success, "Auftrag gelöscht");
        info!("Job {} deleted", job_id);
        Ok(())
    }

    async fn create_job(&self, payload: CreateJobPayload) -> Result<()> {
        let customer_name = payload.customer_name.trim();
        let title = payload.title.trim();
        if customer_name.is_empty() || title.is_empty() {
            let err = PlannerError::InvalidInput(
                "Kunde und Titel dürfen nicht leer sein.".to_string(),
            );
            self.state.write().notify(NoticeLevel::Error, err.to_string());
            return Err(err);
        }

        let customer_id = match self.remote.find_or_create_customer(customer_name).await {
            Ok(id) => id,
            Err(e) => return self.rejected("Kunde konnte nicht erstellt werden", e),
        };
        let new_job = NewJob {
            title: title.to_string(),
            job_type: payload.job_type,
            customer_id,
            status: JobStatus::Open,
        };
        let id = match self.remote.create_job(&new_job).await {
            Ok(id) => id,
            Err(e) => return self.rejected("Auftrag Fehler", e),
        };

        self.resync_after_mutation().await;
        info!("Job {} created for {}", id, customer_name);
        self.state
            .write()
            .notify(NoticeLevel::Success, "Auftrag angelegt");
        Ok(())
    }

    /// Failed mutation: the store stays untouched. Missing records are a
    /// silent no-op; everything else is surfaced to the user.
    fn rejected(&self, context: &str, err: PlannerError) -> Result<()> {
        if let PlannerError::NotFound(what) = &err {
            debug!("{}: {} no longer exists", context, what);
            return Ok(());
        }
        error!("{}: {}", context, err);
        self.state
            .write()
            .notify(NoticeLevel::Error, format!("{context}: {err}"));
        Err(err)
    }

    /// Dashboard counters; each one falls back to zero on its own.
    pub async fn dashboard(&self, today: NaiveDate) -> DashboardStats {
        let day = JobFilter::all().starting_between(
            today.and_time(NaiveTime::MIN),
            today.and_hms_opt(23, 59, 59).unwrap_or(today.and_time(NaiveTime::MIN)),
        );
        let open = JobFilter::all().status(JobStatus::Open);

        DashboardStats {
            active_workers: or_zero(self.remote.count_active_employees().await, "active workers"),
            orders_today: or_zero(self.remote.count_jobs(&day).await, "orders today"),
            open_requests: or_zero(self.remote.count_jobs(&open).await, "open requests"),
        }
    }

    /// Planned jobs of one employee. Without a backend the session's own
    /// store is used.
    pub async fn employee_schedule(
        &self,
        employee_id: &str,
        now: NaiveDateTime,
    ) -> EmployeeSchedule {
        let filter = JobFilter::all()
            .status(JobStatus::Planned)
            .assigned_to(employee_id);

        let mut jobs = match self.remote.list_jobs(&filter).await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("Falling back to cached jobs for {}: {}", employee_id, e);
                let state = self.state.read();
                state
                    .store
                    .jobs()
                    .iter()
                    .filter(|j| j.status == JobStatus::Planned)
                    .filter(|j| j.assigned_to.iter().any(|a| a == employee_id))
                    .cloned()
                    .collect()
            }
        };
        jobs.sort_by_key(|j| j.start);

        let next_job = jobs
            .iter()
            .find(|j| j.end.or(j.start).is_some_and(|t| t > now))
            .cloned();

        EmployeeSchedule {
            employee_id: employee_id.to_string(),
            jobs,
            next_job,
        }
    }

    pub fn job_details(&self, job_id: &str) -> Option<JobDetails> {
        let state = self.state.read();
        let job = state.store.find_by_id(job_id)?;
        let assigned = job
            .assigned_to
            .iter()
            .map(|id| {
                state
                    .store
                    .find_employee(id)
                    .map(|e| e.display_name())
                    .unwrap_or_else(|| id.clone())
            })
            .collect();

        Some(JobDetails {
            id: job.id.clone(),
            title: job.title.clone(),
            customer: job.customer.clone(),
            job_type: job.job_type.clone(),
            status: job.status,
            time: job
                .start
                .map(|s| s.format("%d.%m.%Y, %H:%M").to_string())
                .unwrap_or_else(|| "Nicht geplant".to_string()),
            assigned,
        })
    }

    /// Filter dropdown entries.
    pub fn employees(&self) -> Vec<EmployeeEntry> {
        let state = self.state.read();
        state
            .store
            .employees()
            .iter()
            .map(|e| EmployeeEntry {
                id: e.id.clone(),
                name: e.display_name(),
                color: crate::colors::color_for(e.color_identity()),
            })
            .collect()
    }
}

/// Returns the drag coordinator to idle when the pending drop ends.
struct ResolveOnDrop<'a>(&'a RwLock<PlannerState>);

impl Drop for ResolveOnDrop<'_> {
    fn drop(&mut self) {
        self.0.write().drag.resolve();
    }
}

fn or_zero(result: Result<i64>, what: &str) -> i64 {
    result.unwrap_or_else(|e| {
        warn!("Counting {} failed: {}", what, e);
        0
    })
}
