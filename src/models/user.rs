use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

pub mod role {
    pub const ADMINISTRATOR: &str = "administrator";
    pub const RECRUITER: &str = "recruiter";
}
