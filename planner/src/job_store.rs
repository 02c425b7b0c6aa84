// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{NaiveDate, Timelike};
use common::{Employee, EmployeeFilter, Job};
use tracing::debug;

use crate::colors::EmployeeColorMap;

/// In-memory jobs and employees of the current session.
///
/// The collection is only ever replaced wholesale after a remote fetch, or
/// shrunk by [`JobStore::remove_local`] after a delete.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Vec<Job>,
    employees: Vec<Employee>,
    colors: EmployeeColorMap,
}

impl JobStore {
    pub fn new(jobs: Vec<Job>, employees: Vec<Employee>) -> Self {
        let mut store = Self::default();
        store.replace_all(jobs, employees);
        store
    }

    pub fn replace_all(&mut self, jobs: Vec<Job>, employees: Vec<Employee>) {
        debug!(
            "Replacing job store: {} jobs, {} employees",
            jobs.len(),
            employees.len()
        );
        self.colors = EmployeeColorMap::from_employees(&employees);
        self.jobs = jobs;
        self.employees = employees;
    }

    /// Swaps the job list only; the employee list stays as fetched.
    pub fn replace_jobs(&mut self, jobs: Vec<Job>) {
        debug!("Replacing {} jobs in store", jobs.len());
        self.jobs = jobs;
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn colors(&self) -> &EmployeeColorMap {
        &self.colors
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn find_employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    /// Calendar jobs starting on `date` within the hour `hour:00..hour:59`.
    pub fn filter_by_slot(&self, date: NaiveDate, hour: u32, filter: &EmployeeFilter) -> Vec<&Job> {
        self.calendar_jobs(date, filter)
            .filter(|job| job.start.is_some_and(|s| s.hour() == hour))
            .collect()
    }

    /// Calendar jobs starting anywhere on `date`.
    pub fn filter_by_day(&self, date: NaiveDate, filter: &EmployeeFilter) -> Vec<&Job> {
        self.calendar_jobs(date, filter).collect()
    }

    pub fn has_jobs_on(&self, date: NaiveDate, filter: &EmployeeFilter) -> bool {
        self.calendar_jobs(date, filter).next().is_some()
    }

    fn calendar_jobs<'a, 'f>(
        &'a self,
        date: NaiveDate,
        filter: &'f EmployeeFilter,
    ) -> impl Iterator<Item = &'a Job> {
        self.jobs.iter().filter(move |job| {
            job.is_on_calendar() && job.start_date() == Some(date) && filter.matches(job)
        })
    }

    /// Jobs waiting for a slot, optionally narrowed by a case-insensitive
    /// substring of title or customer.
    pub fn unscheduled_pool(&self, search: Option<&str>) -> Vec<&Job> {
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self.jobs
            .iter()
            .filter(|job| job.is_unscheduled())
            .filter(|job| match &needle {
                Some(n) => {
                    job.title.to_lowercase().contains(n) || job.customer.to_lowercase().contains(n)
                }
                None => true,
            })
            .collect()
    }

    /// Drops a job locally. Returns whether anything was removed.
    pub fn remove_local(&mut self, id: &str) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.id != id);
        let removed = self.jobs.len() != before;
        debug!("Local removal of job {}: removed={}", id, removed);
        removed
    }
}
