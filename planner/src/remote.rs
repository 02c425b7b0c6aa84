// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use async_trait::async_trait;
use common::{Employee, Job, JobFilter, JobPatch, NewJob};

use crate::error::{PlannerError, Result};

/// The backend holding jobs, employee profiles, assignments and customers.
///
/// Every call may fail with [`PlannerError::RemoteUnavailable`]; callers
/// treat that as a normal, non-fatal condition.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Jobs matching `filter`, each with its assignment ids in insertion order.
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>>;

    async fn list_active_employees(&self) -> Result<Vec<Employee>>;

    async fn count_jobs(&self, filter: &JobFilter) -> Result<i64>;

    async fn count_active_employees(&self) -> Result<i64>;

    /// Fails with [`PlannerError::NotFound`] when no job has this id.
    async fn update_job(&self, id: &str, patch: &JobPatch) -> Result<()>;

    async fn delete_job(&self, id: &str) -> Result<()>;

    /// Inserts or refreshes the (job, employee) assignment.
    async fn upsert_assignment(&self, job_id: &str, employee_id: &str, role: &str) -> Result<()>;

    async fn delete_assignments_for_job(&self, job_id: &str) -> Result<()>;

    /// Returns the id of the new job.
    async fn create_job(&self, job: &NewJob) -> Result<String>;

    /// Id of the customer with exactly this name, creating it if needed.
    async fn find_or_create_customer(&self, name: &str) -> Result<String>;
}

/// Stand-in used when no backend is configured. Every call reports the
/// backend as unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

fn offline<T>() -> Result<T> {
    Err(PlannerError::RemoteUnavailable(
        "no remote store configured".to_string(),
    ))
}

#[async_trait]
impl RemoteSync for Offline {
    async fn list_jobs(&self, _filter: &JobFilter) -> Result<Vec<Job>> {
        offline()
    }

    async fn list_active_employees(&self) -> Result<Vec<Employee>> {
        offline()
    }

    async fn count_jobs(&self, _filter: &JobFilter) -> Result<i64> {
        offline()
    }

    async fn count_active_employees(&self) -> Result<i64> {
        offline()
    }

    async fn update_job(&self, _id: &str, _patch: &JobPatch) -> Result<()> {
        offline()
    }

    async fn delete_job(&self, _id: &str) -> Result<()> {
        offline()
    }

    async fn upsert_assignment(
        &self,
        _job_id: &str,
        _employee_id: &str,
        _role: &str,
    ) -> Result<()> {
        offline()
    }

    async fn delete_assignments_for_job(&self, _job_id: &str) -> Result<()> {
        offline()
    }

    async fn create_job(&self, _job: &NewJob) -> Result<String> {
        offline()
    }

    async fn find_or_create_customer(&self, _name: &str) -> Result<String> {
        offline()
    }
}
