use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::models::application::{ApplicationSummary, Qualification};

/// `applyToJob` payload. The `application` object is sanitized before being
/// deserialized into [`ApplicationForm`].
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyToJobPayload {
    pub application: JsonValue,
    #[serde(default)]
    pub finalize: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApplicationForm {
    pub job_id: i64,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: Option<String>,
    /// Custom form fields, keyed by the job's declared field schema.
    #[serde(default)]
    pub fields: serde_json::Map<String, JsonValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyToJobResponse {
    pub application_id: i64,
    pub message: String,
}

/// Multipart metadata accompanying an `uploadApplicationFile` call.
#[derive(Debug, Clone, Default)]
pub struct UploadFileMeta {
    pub application_id: i64,
    pub field_name: Option<String>,
    pub finalize: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ApplicationFilter {
    pub job_id: Option<i64>,
    pub qualification: Option<Qualification>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationsListPayload {
    pub filter: ApplicationFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationsListResponse {
    pub applications: Vec<ApplicationSummary>,
    pub qualified_count: i64,
    pub disqualified_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSinglePayload {
    pub job_id: i64,
    pub application_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveStagePayload {
    pub job_id: i64,
    pub application_id: i64,
    pub stage_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationIdPayload {
    pub application_id: i64,
}
