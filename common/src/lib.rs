// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Job type tag the office uses for maintenance work.
pub const MAINTENANCE_TYPE: &str = "Wartung";

/// Job type used when nothing more specific is known.
pub const DEFAULT_JOB_TYPE: &str = "Standard";

/// Role written to the assignment table when a job is bound to an employee.
pub const ASSIGNMENT_ROLE: &str = "zugewiesen";

/// Lifecycle of a job.
///
/// The wire values are the ones the backend stores (`offen`, `geplant`,
/// `erledigt`); the English names are accepted on input as well.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
pub enum JobStatus {
    #[serde(rename = "offen", alias = "open")]
    #[sqlx(rename = "offen")]
    Open,
    #[serde(rename = "geplant", alias = "planned")]
    #[sqlx(rename = "geplant")]
    Planned,
    #[serde(rename = "erledigt", alias = "done")]
    #[sqlx(rename = "erledigt")]
    Done,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "offen",
            JobStatus::Planned => "geplant",
            JobStatus::Done => "erledigt",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of scheduled or unscheduled work.
///
/// `assigned_to` keeps the backend's insertion order: the first entry decides
/// the card color.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub customer: String,
    #[serde(rename = "type", default = "default_job_type")]
    pub job_type: String,
    pub status: JobStatus,
    #[serde(default, with = "wire_datetime::option")]
    pub start: Option<NaiveDateTime>,
    #[serde(default, with = "wire_datetime::option")]
    pub end: Option<NaiveDateTime>,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_job_type() -> String {
    DEFAULT_JOB_TYPE.to_string()
}

impl Job {
    /// A job belongs in the unscheduled pool when it is open or has no start.
    pub fn is_unscheduled(&self) -> bool {
        self.status == JobStatus::Open || self.start.is_none()
    }

    /// A job appears on the calendar when it is not open and has a start.
    pub fn is_on_calendar(&self) -> bool {
        self.status != JobStatus::Open && self.start.is_some()
    }

    pub fn is_maintenance(&self) -> bool {
        self.job_type == MAINTENANCE_TYPE
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start.map(|s| s.date())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
pub enum EmployeeStatus {
    #[serde(rename = "aktiv", alias = "active")]
    #[sqlx(rename = "aktiv")]
    Active,
    #[serde(rename = "inaktiv", alias = "inactive")]
    #[sqlx(rename = "inaktiv")]
    Inactive,
    #[serde(rename = "krank", alias = "sick")]
    #[sqlx(rename = "krank")]
    Sick,
}

/// A worker who can be assigned jobs. Read-only for the scheduling core.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Employee {
    pub id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: EmployeeStatus,
}

impl Employee {
    /// "First Last" when a first name exists, otherwise the handle, otherwise the id.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.username) {
            (Some(first), _) if !first.is_empty() => {
                let last = self.last_name.as_deref().unwrap_or("");
                format!("{first} {last}").trim_end().to_string()
            }
            (_, Some(handle)) if !handle.is_empty() => handle.clone(),
            _ => self.id.clone(),
        }
    }

    /// The string the display color is derived from.
    pub fn color_identity(&self) -> &str {
        match &self.username {
            Some(handle) if !handle.is_empty() => handle,
            _ => &self.id,
        }
    }
}

/// Calendar zoom level.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl Granularity {
    /// Day and week use the hour table; month and year use the grid.
    pub fn is_timeline(&self) -> bool {
        matches!(self, Granularity::Day | Granularity::Week)
    }
}

/// Either every employee or a single employee id.
///
/// Serialized as the plain string `"all"` or the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EmployeeFilter {
    #[default]
    All,
    Employee(String),
}

impl EmployeeFilter {
    pub fn matches(&self, job: &Job) -> bool {
        match self {
            EmployeeFilter::All => true,
            EmployeeFilter::Employee(id) => job.assigned_to.iter().any(|a| a == id),
        }
    }

    pub fn employee_id(&self) -> Option<&str> {
        match self {
            EmployeeFilter::All => None,
            EmployeeFilter::Employee(id) => Some(id),
        }
    }
}

impl fmt::Display for EmployeeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployeeFilter::All => f.write_str("all"),
            EmployeeFilter::Employee(id) => f.write_str(id),
        }
    }
}

impl FromStr for EmployeeFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" | "all" => EmployeeFilter::All,
            id => EmployeeFilter::Employee(id.to_string()),
        })
    }
}

impl Serialize for EmployeeFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EmployeeFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

/// Partial update of a job. `Some(None)` clears a timestamp.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub start: Option<Option<NaiveDateTime>>,
    pub end: Option<Option<NaiveDateTime>>,
}

impl JobPatch {
    /// Back to the pool: open, no start, no end.
    pub fn unschedule() -> Self {
        Self {
            status: Some(JobStatus::Open),
            start: Some(None),
            end: Some(None),
        }
    }

    pub fn schedule(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            status: Some(JobStatus::Planned),
            start: Some(Some(start)),
            end: Some(Some(end)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.start.is_none() && self.end.is_none()
    }
}

/// Query over the remote job collection. Every set field narrows the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    /// Inclusive lower bound on the start timestamp.
    pub start_from: Option<NaiveDateTime>,
    /// Inclusive upper bound on the start timestamp.
    pub start_to: Option<NaiveDateTime>,
    /// Only jobs with an assignment record for this employee.
    pub assigned_to: Option<String>,
}

impl JobFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn starting_between(mut self, from: NaiveDateTime, to: NaiveDateTime) -> Self {
        self.start_from = Some(from);
        self.start_to = Some(to);
        self
    }

    pub fn assigned_to(mut self, employee_id: impl Into<String>) -> Self {
        self.assigned_to = Some(employee_id.into());
        self
    }
}

/// Structure used to receive job creation data from the office form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateJobPayload {
    pub customer_name: String,
    pub title: String,
    #[serde(rename = "type", default = "default_job_type")]
    pub job_type: String,
}

/// Row handed to the backend when a job is inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub job_type: String,
    pub customer_id: String,
    pub status: JobStatus,
}

/// Counters shown on the office dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub active_workers: i64,
    pub orders_today: i64,
    pub open_requests: i64,
}

/// ISO-8601 local-naive timestamps as exchanged with the backend.
///
/// Always written as `YYYY-MM-DDTHH:mm:ss`; read with or without seconds.
pub mod wire_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
    const SHORT_FORMAT: &str = "%Y-%m-%dT%H:%M";

    pub fn format(value: &NaiveDateTime) -> String {
        value.format(FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, SHORT_FORMAT))
    }

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_str(&super::format(v)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw {
                Some(s) if !s.is_empty() => super::parse(&s)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(first: Option<&str>, last: Option<&str>, handle: Option<&str>) -> Employee {
        Employee {
            id: "u1".to_string(),
            username: handle.map(str::to_string),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            status: EmployeeStatus::Active,
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(
            employee(Some("Max"), Some("Mustermann"), Some("max")).display_name(),
            "Max Mustermann"
        );
        assert_eq!(employee(Some("Julia"), None, None).display_name(), "Julia");
        assert_eq!(employee(None, Some("Schmidt"), Some("julia")).display_name(), "julia");
        assert_eq!(employee(None, None, None).display_name(), "u1");
    }

    #[test]
    fn test_color_identity_prefers_handle() {
        assert_eq!(employee(None, None, Some("max")).color_identity(), "max");
        assert_eq!(employee(None, None, Some("")).color_identity(), "u1");
    }

    #[test]
    fn test_job_reads_backend_shape() {
        // Minute precision and German status, as the mock backend delivers it.
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "j1",
            "title": "Müller Badrenovierung",
            "customer": "Fam. Müller",
            "type": "Installation",
            "status": "geplant",
            "start": "2025-12-29T08:00",
            "end": "2025-12-29T16:00:00",
            "assigned_to": ["u1", "u2"]
        }))
        .unwrap();

        assert_eq!(job.status, JobStatus::Planned);
        assert_eq!(
            job.start,
            Some(NaiveDate::from_ymd_opt(2025, 12, 29).unwrap().and_hms_opt(8, 0, 0).unwrap())
        );
        assert!(job.is_on_calendar());

        let out = serde_json::to_value(&job).unwrap();
        assert_eq!(out["start"], "2025-12-29T08:00:00");
        assert_eq!(out["status"], "geplant");
    }

    #[test]
    fn test_open_job_with_start_stays_in_pool() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "j3",
            "title": "Rohrbruch Notdienst",
            "customer": "Kiga Sonnenschein",
            "status": "open",
            "start": "2025-12-29T13:00"
        }))
        .unwrap();

        assert_eq!(job.job_type, DEFAULT_JOB_TYPE);
        assert!(job.is_unscheduled());
        assert!(!job.is_on_calendar());
    }

    #[test]
    fn test_employee_filter_serde() {
        let all: EmployeeFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, EmployeeFilter::All);
        let one: EmployeeFilter = serde_json::from_str("\"u2\"").unwrap();
        assert_eq!(one, EmployeeFilter::Employee("u2".to_string()));
        assert_eq!(serde_json::to_string(&one).unwrap(), "\"u2\"");
    }

    #[test]
    fn test_unschedule_patch_clears_times() {
        let patch = JobPatch::unschedule();
        assert_eq!(patch.status, Some(JobStatus::Open));
        assert_eq!(patch.start, Some(None));
        assert_eq!(patch.end, Some(None));
        assert!(!patch.is_empty());
        assert!(JobPatch::default().is_empty());
    }
}
