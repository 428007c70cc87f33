use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub department_id: Option<i64>,
    pub employment_type: Option<String>,
    pub country_code: Option<String>,
    pub address: Option<String>,
    pub vacancy_count: i32,
    pub salary_from: Option<Decimal>,
    pub salary_to: Option<Decimal>,
    pub currency: Option<String>,
    pub status: String,
    pub field_schema: JsonValue,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// What the public careers listing shows per job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub employment_type: Option<String>,
    pub country_code: Option<String>,
    pub salary_from: Option<Decimal>,
    pub salary_to: Option<Decimal>,
    pub currency: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub job_count: Option<i64>,
}
