use crate::error::Result;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

/// Well-known setting names.
pub mod keys {
    pub const RECRUITER_EMAIL: &str = "recruiter_email";
    pub const COMPANY_ADDRESS: &str = "company_address";
    pub const UPLOAD_MAX_BYTES: &str = "upload_max_bytes";
    pub const CAREERS_BASE_COLOR: &str = "careers_base_color";
    pub const APPLICATION_FORM_LAYOUT: &str = "application_form_layout";
}

pub const DEFAULT_UPLOAD_MAX_BYTES: i64 = 5 * 1024 * 1024;
pub const DEFAULT_BASE_COLOR: &str = "#1a73e8";

/// Flat key/value configuration store, read by many collaborators and written
/// only through the administrative save action.
#[derive(Clone)]
pub struct SettingsService {
    pool: PgPool,
}

impl SettingsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, name: &str) -> Result<Option<JsonValue>> {
        let row: Option<(JsonValue,)> =
            sqlx::query_as("SELECT value FROM settings WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    pub async fn get_string(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .get(name)
            .await?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    pub async fn get_all(&self) -> Result<serde_json::Map<String, JsonValue>> {
        let rows: Vec<(String, JsonValue)> =
            sqlx::query_as("SELECT name, value FROM settings ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn save_many(&self, settings: &serde_json::Map<String, JsonValue>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (name, value) in settings {
            sqlx::query(
                "INSERT INTO settings (name, value) VALUES ($1, $2)
                 ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
            )
            .bind(name)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn recruiter_email(&self) -> Result<Option<String>> {
        self.get_string(keys::RECRUITER_EMAIL).await
    }

    pub async fn upload_max_bytes(&self) -> Result<i64> {
        Ok(self
            .get(keys::UPLOAD_MAX_BYTES)
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(DEFAULT_UPLOAD_MAX_BYTES))
    }

    pub async fn careers_base_color(&self) -> Result<String> {
        Ok(self
            .get_string(keys::CAREERS_BASE_COLOR)
            .await?
            .unwrap_or_else(|| DEFAULT_BASE_COLOR.to_string()))
    }
}
