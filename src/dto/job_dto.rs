use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::models::job::{Department, JobSummary};

/// Payload for creating a job posting, used by the editor surface and by
/// seeding. Stages (including the reserved disqualified stage) are
/// provisioned alongside.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    pub department_name: Option<String>,
    pub employment_type: Option<String>,
    pub country_code: Option<String>,
    pub address: Option<String>,
    #[serde(default = "default_vacancy_count")]
    pub vacancy_count: i32,
    pub salary_from: Option<Decimal>,
    pub salary_to: Option<Decimal>,
    pub currency: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub field_schema: JsonValue,
}

fn default_vacancy_count() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CareersFilter {
    pub department_id: Option<i64>,
    pub country_code: Option<String>,
    pub employment_type: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CareersListingPayload {
    #[serde(default)]
    pub filters: CareersFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct CareersListingResponse {
    pub jobs: Vec<JobSummary>,
    pub departments: Vec<Department>,
    pub countries: Vec<String>,
}
