use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: Option<String>,
    pub stage_id: Option<i64>,
    pub is_complete: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Listing row: the application plus its current stage name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationSummary {
    pub id: i64,
    pub job_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub stage_id: Option<i64>,
    pub stage_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub stage_name: Option<String>,
    pub values: Vec<StoredValue>,
    pub recruiter_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredValue {
    pub field_key: String,
    pub field_value: JsonValue,
}

/// Binary classification used by the applications list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Qualification {
    #[default]
    Qualified,
    Disqualified,
}

impl Qualification {
    pub fn inverted(self) -> Self {
        match self {
            Qualification::Qualified => Qualification::Disqualified,
            Qualification::Disqualified => Qualification::Qualified,
        }
    }
}
