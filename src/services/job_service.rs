use crate::dto::job_dto::{CareersFilter, CreateJobPayload};
use crate::error::Result;
use crate::models::job::{Department, Job, JobSummary};
use crate::models::stage::{Stage, DEFAULT_STAGES, DISQUALIFIED_STAGE};
use crate::utils::paging;
use sqlx::{PgPool, QueryBuilder};

const JOB_COLUMNS: &str = "id, title, description, department_id, employment_type, country_code, \
                           address, vacancy_count, salary_from, salary_to, currency, status, \
                           field_schema, created_at, updated_at";

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, payload: CreateJobPayload) -> Result<Job> {
        let mut tx = self.pool.begin().await?;

        let department_id = match &payload.department_name {
            Some(name) => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO departments (name) VALUES ($1)
                     ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                     RETURNING id",
                )
                .bind(name)
                .fetch_one(&mut *tx)
                .await?;
                Some(id)
            }
            None => None,
        };

        let status = payload.status.unwrap_or_else(|| "draft".to_string());
        let field_schema = if payload.field_schema.is_null() {
            serde_json::json!([])
        } else {
            payload.field_schema
        };

        let job = sqlx::query_as::<_, Job>(&format!(
            "INSERT INTO jobs (title, description, department_id, employment_type, country_code,
                               address, vacancy_count, salary_from, salary_to, currency, status,
                               field_schema)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {}",
            JOB_COLUMNS
        ))
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(department_id)
        .bind(&payload.employment_type)
        .bind(&payload.country_code)
        .bind(&payload.address)
        .bind(payload.vacancy_count)
        .bind(payload.salary_from)
        .bind(payload.salary_to)
        .bind(&payload.currency)
        .bind(&status)
        .bind(&field_schema)
        .fetch_one(&mut *tx)
        .await?;

        // Default stage set; the reserved disqualified stage sorts last.
        for (sequence, name) in DEFAULT_STAGES.iter().enumerate() {
            sqlx::query("INSERT INTO stages (job_id, name, sequence) VALUES ($1, $2, $3)")
                .bind(job.id)
                .bind(name)
                .bind(sequence as i32)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("INSERT INTO stages (job_id, name, sequence) VALUES ($1, $2, $3)")
            .bind(job.id)
            .bind(DISQUALIFIED_STAGE)
            .bind(DEFAULT_STAGES.len() as i32)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(job)
    }

    pub async fn get_job(&self, id: i64) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    pub async fn get_stage(&self, job_id: i64, stage_id: i64) -> Result<Option<Stage>> {
        let stage = sqlx::query_as::<_, Stage>(
            "SELECT id, job_id, name, sequence FROM stages WHERE job_id = $1 AND id = $2",
        )
        .bind(job_id)
        .bind(stage_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stage)
    }

    pub async fn job_stages(&self, job_id: i64) -> Result<Vec<Stage>> {
        let stages = sqlx::query_as::<_, Stage>(
            "SELECT id, job_id, name, sequence FROM stages WHERE job_id = $1 ORDER BY sequence ASC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stages)
    }

    /// Published jobs matching the careers filter.
    pub async fn careers_listing(&self, filter: &CareersFilter) -> Result<Vec<JobSummary>> {
        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT j.id, j.title, j.description, j.department_id, d.name AS department_name,
                    j.employment_type, j.country_code, j.salary_from, j.salary_to, j.currency,
                    j.created_at
             FROM jobs j
             LEFT JOIN departments d ON d.id = j.department_id
             WHERE j.status = 'publish'",
        );

        if let Some(department_id) = filter.department_id {
            qb.push(" AND j.department_id = ").push_bind(department_id);
        }
        if let Some(country_code) = &filter.country_code {
            qb.push(" AND j.country_code = ").push_bind(country_code.clone());
        }
        if let Some(employment_type) = &filter.employment_type {
            qb.push(" AND j.employment_type = ")
                .push_bind(employment_type.clone());
        }
        if let Some(search) = &filter.search {
            if !search.is_empty() {
                let pattern = format!("%{}%", search);
                qb.push(" AND (j.title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR j.description ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        let (limit, offset) = paging::limit_offset(filter.page, filter.limit, 20);
        qb.push(" ORDER BY j.created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let jobs = qb.build_query_as::<JobSummary>().fetch_all(&self.pool).await?;
        Ok(jobs)
    }

    /// Department facet for the careers sidebar: departments that currently
    /// have published jobs, with their job counts.
    pub async fn department_facets(&self) -> Result<Vec<Department>> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT d.id, d.name, COUNT(j.id) AS job_count
             FROM departments d
             JOIN jobs j ON j.department_id = d.id AND j.status = 'publish'
             GROUP BY d.id, d.name
             ORDER BY d.name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    pub async fn country_facets(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT country_code FROM jobs
             WHERE status = 'publish' AND country_code IS NOT NULL
             ORDER BY country_code ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(code,)| code).collect())
    }
}
