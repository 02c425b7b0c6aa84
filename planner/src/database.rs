// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use common::{Employee, EmployeeStatus, Job, JobFilter, JobPatch, JobStatus, NewJob};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PlannerError, Result};
use crate::remote::RemoteSync;

/// Display name used when a job has no linked customer.
const UNKNOWN_CUSTOMER: &str = "Kunde ?";

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY,
        username TEXT NULL,
        first_name TEXT NULL,
        last_name TEXT NULL,
        status TEXT NOT NULL DEFAULT 'aktiv'
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        job_type TEXT NOT NULL DEFAULT 'Standard',
        description TEXT NULL,
        customer_id TEXT NULL REFERENCES customers(id),
        status TEXT NOT NULL CHECK (status IN ('offen', 'geplant', 'erledigt')),
        planned_start TIMESTAMP NULL,
        planned_end TIMESTAMP NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS job_assignments (
        job_id TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        role TEXT NOT NULL,
        PRIMARY KEY (job_id, user_id)
    );
    "#,
];

/// Establishes the database connection pool.
/// If the database does not exist, it creates it (and its directory).
/// It also ensures every table has the expected schema.
pub async fn establish_connection_pool(database_url: &str) -> AnyResult<SqlitePool> {
    if let Some(parent) = database_file(database_url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }
    }

    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    init_schema(&pool)
        .await
        .context("Failed to create planner tables")?;

    info!("Planner tables are ready.");

    Ok(pool)
}

fn database_file(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.contains(":memory:") {
        None
    } else {
        Some(Path::new(path))
    }
}

pub async fn init_schema(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    title: String,
    job_type: String,
    description: Option<String>,
    status: JobStatus,
    planned_start: Option<NaiveDateTime>,
    planned_end: Option<NaiveDateTime>,
    customer_name: Option<String>,
}

impl JobRow {
    fn into_job(self, assigned_to: Vec<String>) -> Job {
        Job {
            id: self.id,
            title: self.title,
            customer: self
                .customer_name
                .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string()),
            job_type: self.job_type,
            status: self.status,
            start: self.planned_start,
            end: self.planned_end,
            assigned_to,
            description: self.description,
        }
    }
}

fn push_job_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &JobFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND j.status = ").push_bind(status);
    }
    if let Some(from) = filter.start_from {
        qb.push(" AND j.planned_start >= ").push_bind(from);
    }
    if let Some(to) = filter.start_to {
        qb.push(" AND j.planned_start <= ").push_bind(to);
    }
    if let Some(employee_id) = &filter.assigned_to {
        qb.push(
            " AND EXISTS (SELECT 1 FROM job_assignments a \
             WHERE a.job_id = j.id AND a.user_id = ",
        )
        .push_bind(employee_id.clone())
        .push(")");
    }
}

/// [`RemoteSync`] backed by a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteRemote {
    pool: SqlitePool,
}

impl SqliteRemote {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn assignments(&self) -> Result<HashMap<String, Vec<String>>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT job_id, user_id FROM job_assignments ORDER BY rowid ASC")
                .fetch_all(&self.pool)
                .await?;

        let mut by_job: HashMap<String, Vec<String>> = HashMap::new();
        for (job_id, user_id) in rows {
            by_job.entry(job_id).or_default().push(user_id);
        }
        Ok(by_job)
    }
}

#[async_trait]
impl RemoteSync for SqliteRemote {
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT j.id, j.title, j.job_type, j.description, j.status, j.planned_start, j.planned_end, \
             c.name AS customer_name \
             FROM jobs j LEFT JOIN customers c ON c.id = j.customer_id WHERE 1 = 1",
        );
        push_job_filter(&mut qb, filter);
        qb.push(" ORDER BY j.planned_start IS NULL, j.planned_start ASC, j.rowid ASC");

        let rows: Vec<JobRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let mut assignments = self.assignments().await?;

        let jobs: Vec<Job> = rows
            .into_iter()
            .map(|row| {
                let assigned = assignments.remove(&row.id).unwrap_or_default();
                row.into_job(assigned)
            })
            .collect();

        debug!("Listed {} jobs for {:?}", jobs.len(), filter);
        Ok(jobs)
    }

    async fn list_active_employees(&self) -> Result<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT id, username, first_name, last_name, status FROM profiles WHERE status = ? ORDER BY rowid ASC",
        )
        .bind(EmployeeStatus::Active)
        .fetch_all(&self.pool)
        .await?;

        debug!("Listed {} active employees", employees.len());
        Ok(employees)
    }

    async fn count_jobs(&self, filter: &JobFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM jobs j WHERE 1 = 1");
        push_job_filter(&mut qb, filter);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn count_active_employees(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE status = ?")
            .bind(EmployeeStatus::Active)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update_job(&self, id: &str, patch: &JobPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        debug!("Updating job {} with {:?}", id, patch);

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE jobs SET ");
        {
            let mut fields = qb.separated(", ");
            if let Some(status) = patch.status {
                fields.push("status = ").push_bind_unseparated(status);
            }
            if let Some(start) = patch.start {
                fields.push("planned_start = ").push_bind_unseparated(start);
            }
            if let Some(end) = patch.end {
                fields.push("planned_end = ").push_bind_unseparated(end);
            }
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(PlannerError::NotFound(format!("job {id}")));
        }
        info!("Updated job {}", id);
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<()> {
        debug!("Attempting to delete job with ID: {}", id);
        sqlx::query("DELETE FROM job_assignments WHERE job_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PlannerError::NotFound(format!("job {id}")));
        }
        info!("Deleted job {}", id);
        Ok(())
    }

    async fn upsert_assignment(&self, job_id: &str, employee_id: &str, role: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO job_assignments (job_id, user_id, role) VALUES (?, ?, ?) \
             ON CONFLICT(job_id, user_id) DO UPDATE SET role = excluded.role",
        )
        .bind(job_id)
        .bind(employee_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        info!("Assigned job {} to {} as {}", job_id, employee_id, role);
        Ok(())
    }

    async fn delete_assignments_for_job(&self, job_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM job_assignments WHERE job_id = ?")
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        info!(
            "Removed {} assignments of job {}",
            result.rows_affected(),
            job_id
        );
        Ok(())
    }

    async fn create_job(&self, job: &NewJob) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO jobs (id, title, job_type, customer_id, status, planned_start, planned_end) \
             VALUES (?, ?, ?, ?, ?, NULL, NULL)",
        )
        .bind(&id)
        .bind(&job.title)
        .bind(&job.job_type)
        .bind(&job.customer_id)
        .bind(job.status)
        .execute(&self.pool)
        .await?;

        info!("Created job {} ({})", id, job.title);
        Ok(id)
    }

    async fn find_or_create_customer(&self, name: &str) -> Result<String> {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM customers WHERE name = ? ORDER BY rowid LIMIT 1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        if let Some(id) = existing {
            debug!("Found customer {} for {}", id, name);
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO customers (id, name) VALUES (?, ?)")
            .bind(&id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        info!("Created customer {} for {}", id, name);
        Ok(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use common::ASSIGNMENT_ROLE;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Helper function to set up an in-memory SQLite database for testing.
    /// A single connection keeps every query on the same in-memory database.
    pub(crate) async fn setup_test_db() -> SqliteRemote {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        SqliteRemote::new(pool)
    }

    pub(crate) async fn insert_profile(
        remote: &SqliteRemote,
        id: &str,
        username: &str,
        status: &str,
    ) {
        sqlx::query("INSERT INTO profiles (id, username, status) VALUES (?, ?, ?)")
            .bind(id)
            .bind(username)
            .bind(status)
            .execute(remote.pool())
            .await
            .unwrap();
    }

    async fn new_job(remote: &SqliteRemote, title: &str, customer: &str) -> String {
        let customer_id = remote.find_or_create_customer(customer).await.unwrap();
        remote
            .create_job(&NewJob {
                title: title.to_string(),
                job_type: "Standard".to_string(),
                customer_id,
                status: JobStatus::Open,
            })
            .await
            .unwrap()
    }

    fn at(raw: &str) -> NaiveDateTime {
        common::wire_datetime::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list_job() {
        let remote = setup_test_db().await;
        let id = new_job(&remote, "Rohrbruch Notdienst", "Kiga Sonnenschein").await;

        let jobs = remote.list_jobs(&JobFilter::all()).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, id);
        assert_eq!(jobs[0].customer, "Kiga Sonnenschein");
        assert_eq!(jobs[0].status, JobStatus::Open);
        assert!(jobs[0].start.is_none());
        assert!(jobs[0].assigned_to.is_empty());
    }

    #[tokio::test]
    async fn test_customer_is_reused() {
        let remote = setup_test_db().await;
        let first = remote.find_or_create_customer("Fam. Müller").await.unwrap();
        let second = remote.find_or_create_customer("Fam. Müller").await.unwrap();
        let other = remote.find_or_create_customer("Bauprojekt Hafen").await.unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_schedule_and_unschedule() {
        let remote = setup_test_db().await;
        let id = new_job(&remote, "Wartung Heizung", "Bürokomplex West").await;

        let patch = JobPatch::schedule(at("2025-12-29T13:00:00"), at("2025-12-29T14:00:00"));
        remote.update_job(&id, &patch).await.unwrap();

        let jobs = remote.list_jobs(&JobFilter::all()).await.unwrap();
        assert_eq!(jobs[0].status, JobStatus::Planned);
        assert_eq!(jobs[0].start, Some(at("2025-12-29T13:00:00")));
        assert_eq!(jobs[0].end, Some(at("2025-12-29T14:00:00")));

        remote.update_job(&id, &JobPatch::unschedule()).await.unwrap();
        let jobs = remote.list_jobs(&JobFilter::all()).await.unwrap();
        assert_eq!(jobs[0].status, JobStatus::Open);
        assert!(jobs[0].start.is_none());
        assert!(jobs[0].end.is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_job_is_not_found() {
        let remote = setup_test_db().await;
        let result = remote.update_job("missing", &JobPatch::unschedule()).await;
        assert!(matches!(result, Err(PlannerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_assignments_keep_insertion_order() {
        let remote = setup_test_db().await;
        let id = new_job(&remote, "Badrenovierung", "Fam. Müller").await;

        remote.upsert_assignment(&id, "u2", ASSIGNMENT_ROLE).await.unwrap();
        remote.upsert_assignment(&id, "u1", ASSIGNMENT_ROLE).await.unwrap();
        // Upserting again must not duplicate or reorder.
        remote.upsert_assignment(&id, "u2", "leitung").await.unwrap();

        let jobs = remote.list_jobs(&JobFilter::all()).await.unwrap();
        assert_eq!(jobs[0].assigned_to, vec!["u2", "u1"]);

        remote.delete_assignments_for_job(&id).await.unwrap();
        let jobs = remote.list_jobs(&JobFilter::all()).await.unwrap();
        assert!(jobs[0].assigned_to.is_empty());
    }

    #[tokio::test]
    async fn test_filters_and_counts() {
        let remote = setup_test_db().await;
        let planned = new_job(&remote, "Elektroinstallation", "Bauprojekt Hafen").await;
        let _open = new_job(&remote, "Rohrbruch", "Kiga").await;
        remote
            .update_job(
                &planned,
                &JobPatch::schedule(at("2025-12-31T08:00:00"), at("2025-12-31T09:00:00")),
            )
            .await
            .unwrap();
        remote.upsert_assignment(&planned, "u1", ASSIGNMENT_ROLE).await.unwrap();

        let day = JobFilter::all()
            .starting_between(at("2025-12-31T00:00:00"), at("2025-12-31T23:59:59"));
        assert_eq!(remote.count_jobs(&day).await.unwrap(), 1);
        let open = JobFilter::all().status(JobStatus::Open);
        assert_eq!(remote.count_jobs(&open).await.unwrap(), 1);

        let mine = JobFilter::all().status(JobStatus::Planned).assigned_to("u1");
        let jobs = remote.list_jobs(&mine).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, planned);
        assert!(remote.list_jobs(&JobFilter::all().assigned_to("u2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_active_employees_only() {
        let remote = setup_test_db().await;
        insert_profile(&remote, "u1", "max", "aktiv").await;
        insert_profile(&remote, "u3", "peter", "krank").await;

        let employees = remote.list_active_employees().await.unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].id, "u1");
        assert_eq!(employees[0].status, EmployeeStatus::Active);
        assert_eq!(remote.count_active_employees().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_job_removes_assignments() {
        let remote = setup_test_db().await;
        let id = new_job(&remote, "Abriss", "Stadt").await;
        remote.upsert_assignment(&id, "u1", ASSIGNMENT_ROLE).await.unwrap();

        remote.delete_job(&id).await.unwrap();
        assert!(remote.list_jobs(&JobFilter::all()).await.unwrap().is_empty());

        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_assignments")
            .fetch_one(remote.pool())
            .await
            .unwrap();
        assert_eq!(left, 0);

        assert!(matches!(remote.delete_job(&id).await, Err(PlannerError::NotFound(_))));
    }

    #[test]
    fn test_database_file_from_url() {
        assert_eq!(
            database_file("sqlite://database/planner.db"),
            Some(Path::new("database/planner.db"))
        );
        assert_eq!(database_file("sqlite::memory:"), None);
        assert_eq!(database_file("postgres://x"), None);
    }
}
