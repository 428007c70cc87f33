use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Reserved stage name marking disqualified applications. Every job gets one
/// at creation; qualification is derived from whether an application sits in
/// it.
pub const DISQUALIFIED_STAGE: &str = "_disqualified_";

/// Stage names provisioned for every new job, in board order.
pub const DEFAULT_STAGES: &[&str] = &["Applied", "Screening", "Interview", "Offer"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Stage {
    pub id: i64,
    pub job_id: i64,
    pub name: String,
    pub sequence: i32,
}
