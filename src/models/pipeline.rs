use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// One append-only activity entry tied to an application. Entries are never
/// updated or deleted individually; the timeline is read back in creation
/// order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PipelineEntry {
    pub id: i64,
    pub application_id: i64,
    pub event_type: String,
    pub stage_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub detail: Option<JsonValue>,
    pub created_at: Option<DateTime<Utc>>,
}

pub mod event_type {
    pub const APPLIED: &str = "applied";
    pub const STAGE_CHANGE: &str = "stage_change";
    pub const DISQUALIFIED: &str = "disqualified";
    pub const NOTE: &str = "note";
}
